/// Required title keywords. A title passes only if it contains every keyword
/// as a case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|kw| kw.as_ref().trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect();
        Self { keywords }
    }

    /// Builds a filter from a comma separated list such as `"tv, PlayStation"`.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords absent from `title`, in configured order.
    pub fn missing<'a>(&'a self, title: &str) -> Vec<&'a str> {
        let lowered = title.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| !lowered.contains(kw.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn matches(&self, title: &str) -> bool {
        self.missing(title).is_empty()
    }
}
