use watch_core::{
    KeywordFilter, PageSource, PersistOutcome, QueryTarget, RunSummary, SeenSet, TargetReport,
};
use watch_logging::{watch_error, watch_info};

use crate::extract::ListingExtractor;
use crate::fetch::PageFetcher;
use crate::notify::{dispatch, Messenger};
use crate::persist::SeenStore;

/// Collaborators for one polling run.
pub struct Runner<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub extractor: &'a ListingExtractor,
    pub messenger: &'a dyn Messenger,
    pub store: &'a dyn SeenStore,
}

impl Runner<'_> {
    /// Fetch and extract every target, partition the candidates against
    /// `seen` once, then announce and persist only if something is new.
    ///
    /// Targets are handled one after the other. No failure aborts the run.
    pub async fn run_once(
        &self,
        targets: &[QueryTarget],
        filter: &KeywordFilter,
        seen: &mut SeenSet,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut candidates = Vec::new();

        for target in targets {
            let report = match self.fetcher.fetch(target.as_str()).await {
                Ok(page) => {
                    let records = self.extractor.extract(&page.html, &target.origin(), filter);
                    let meta = page.metadata;
                    watch_info!(
                        "Parsed {} ads from {} (final {}, {} redirects, {} bytes, {})",
                        records.len(),
                        target,
                        meta.final_url,
                        meta.redirect_count,
                        meta.byte_len,
                        meta.encoding_label
                    );
                    let count = records.len();
                    candidates.extend(records);
                    TargetReport {
                        url: target.to_string(),
                        source: Some(PageSource {
                            final_url: meta.final_url,
                            redirects: meta.redirect_count,
                            bytes: meta.byte_len,
                            encoding: meta.encoding_label,
                        }),
                        parsed: Ok(count),
                    }
                }
                Err(err) => {
                    watch_error!("Failed to fetch {}: {}", target, err);
                    TargetReport {
                        url: target.to_string(),
                        source: None,
                        parsed: Err(err.to_string()),
                    }
                }
            };
            summary.targets.push(report);
        }

        summary.candidates = candidates.len();
        let fresh = seen.partition_new(candidates);
        summary.new_records = fresh.len();
        watch_info!(
            "Check complete. Total new ads found: {} (of {} candidates)",
            fresh.len(),
            summary.candidates
        );

        if fresh.is_empty() {
            watch_info!("No new ads this cycle.");
            return summary;
        }

        for record in &fresh {
            if dispatch(record, self.messenger).await {
                summary.delivered += 1;
            } else {
                summary.failed_deliveries += 1;
            }
        }

        summary.persist = match self.store.save(seen) {
            Ok(()) => PersistOutcome::Persisted,
            Err(err) => {
                watch_error!("Failed to save seen ads: {}", err);
                PersistOutcome::Failed(err.to_string())
            }
        };
        summary
    }
}
