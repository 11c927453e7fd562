/// What happened to the seen set at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistOutcome {
    /// Nothing new was found, so nothing was written.
    #[default]
    Skipped,
    Persisted,
    Failed(String),
}

/// Where a target's page was actually served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    pub final_url: String,
    pub redirects: usize,
    pub bytes: u64,
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub url: String,
    /// `None` when the fetch failed.
    pub source: Option<PageSource>,
    /// Records that survived extraction and filtering, or the fetch failure.
    pub parsed: Result<usize, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub targets: Vec<TargetReport>,
    pub candidates: usize,
    pub new_records: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub persist: PersistOutcome,
}

impl RunSummary {
    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| t.parsed.is_err()).count()
    }
}
