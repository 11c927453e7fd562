use std::fmt;

use url::Url;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid query url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("query url {0} must use http or https")]
    UnsupportedScheme(String),
}

/// A search-results page to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    url: Url,
}

impl QueryTarget {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|err| TargetError::InvalidUrl {
            url: trimmed.to_string(),
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TargetError::UnsupportedScheme(trimmed.to_string()));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Scheme, host and port of the target with an empty path. Relative ad
    /// links are resolved against this.
    pub fn origin(&self) -> Url {
        let mut origin = self.url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        origin
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
