//! Process configuration: built-in defaults, then an optional RON file, then
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use watch_core::{KeywordFilter, QueryTarget};
use watch_engine::{CardMarkers, FetchSettings, TelegramSettings, TELEGRAM_API_BASE};

pub const CONFIG_PATH_ENV: &str = "LISTING_WATCH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "listing_watch.ron";

const DEFAULT_QUERY: &str = "https://www.olx.ua/uk/list/q-playstation-tv/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: None,
            chat_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search-results pages polled on every run.
    pub queries: Vec<String>,
    /// Comma separated, case-insensitive; every keyword must appear in a title.
    pub title_keywords: String,
    pub seen_file: PathBuf,
    pub fetch_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub user_agent: String,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub announce_start: bool,
    pub announce_summary: bool,
    pub telegram: TelegramConfig,
    pub markers: CardMarkers,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            queries: vec![DEFAULT_QUERY.to_string()],
            title_keywords: "tv,playstation".to_string(),
            seen_file: PathBuf::from("seen_ads.json"),
            fetch_timeout_secs: fetch.request_timeout.as_secs(),
            notify_timeout_secs: TelegramSettings::default().timeout.as_secs(),
            user_agent: fetch.user_agent,
            log_level: "info".to_string(),
            log_file: None,
            announce_start: false,
            announce_summary: false,
            telegram: TelegramConfig::default(),
            markers: CardMarkers::default(),
        }
    }
}

impl AppConfig {
    /// Reads the config file named by `LISTING_WATCH_CONFIG` (or
    /// `listing_watch.ron` when present) and applies process environment
    /// overrides.
    pub fn load() -> anyhow::Result<Self> {
        let file = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Some(read_config_file(Path::new(&path))?),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Some(read_config_file(default)?)
                } else {
                    None
                }
            }
        };
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = match file {
            Some(text) => ron::from_str(text).context("malformed configuration file")?,
            None => Self::default(),
        };
        config.apply_env(env);
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = env("OLX_QUERIES") {
            self.queries = raw
                .split(',')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        if let Some(keywords) = env("OLX_TITLE_KEYWORDS") {
            self.title_keywords = keywords;
        }
        if let Some(path) = env("OLX_SEEN_FILE") {
            self.seen_file = PathBuf::from(path);
        }
        if let Some(level) = env("LISTING_WATCH_LOG") {
            self.log_level = level;
        }
        if let Some(token) = env("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat) = env("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat);
        }
    }

    /// Every configured query must be an absolute http(s) URL.
    pub fn targets(&self) -> anyhow::Result<Vec<QueryTarget>> {
        self.queries
            .iter()
            .map(|raw| QueryTarget::parse(raw).map_err(anyhow::Error::from))
            .collect()
    }

    pub fn keyword_filter(&self) -> KeywordFilter {
        KeywordFilter::parse(&self.title_keywords)
    }

    pub fn level(&self) -> LevelFilter {
        watch_logging::parse_level(&self.log_level)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.fetch_timeout_secs),
            user_agent: self.user_agent.clone(),
            ..FetchSettings::default()
        }
    }

    pub fn telegram_settings(&self) -> TelegramSettings {
        TelegramSettings {
            api_base: self.telegram.api_base.clone(),
            bot_token: self.telegram.bot_token.clone(),
            chat_id: self.telegram.chat_id.clone(),
            timeout: Duration::from_secs(self.notify_timeout_secs),
        }
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read config file {path:?}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::AppConfig;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_watch_the_playstation_tv_query() {
        let config = AppConfig::from_sources(None, env(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(
            config.queries,
            vec!["https://www.olx.ua/uk/list/q-playstation-tv/".to_string()]
        );
        assert_eq!(config.keyword_filter().keywords(), ["tv", "playstation"]);
        assert_eq!(config.seen_file, PathBuf::from("seen_ads.json"));
        assert_eq!(config.fetch_settings().request_timeout, Duration::from_secs(20));
        assert_eq!(config.telegram_settings().timeout, Duration::from_secs(10));
        assert!(config.telegram.bot_token.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_sources(
            None,
            env(&[
                ("OLX_QUERIES", "https://a.example/list/, https://b.example/list/"),
                ("OLX_TITLE_KEYWORDS", "Vita"),
                ("OLX_SEEN_FILE", "/var/lib/watch/seen.json"),
                ("TELEGRAM_BOT_TOKEN", "1:abc"),
                ("TELEGRAM_CHAT_ID", "77"),
                ("LISTING_WATCH_LOG", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(config.targets().unwrap().len(), 2);
        assert_eq!(config.keyword_filter().keywords(), ["vita"]);
        assert_eq!(config.seen_file, PathBuf::from("/var/lib/watch/seen.json"));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("1:abc"));
        assert_eq!(config.telegram.chat_id.as_deref(), Some("77"));
        assert_eq!(config.level(), log::LevelFilter::Debug);
    }

    #[test]
    fn file_values_apply_and_env_still_wins() {
        let file = r#"(
            queries: ["https://www.olx.pl/oferty/q-ps-tv/"],
            title_keywords: "ps,tv",
            fetch_timeout_secs: 5,
            announce_summary: true,
            telegram: (chat_id: Some("from-file")),
            markers: (card: "li.offer"),
        )"#;
        let config =
            AppConfig::from_sources(Some(file), env(&[("TELEGRAM_CHAT_ID", "from-env")])).unwrap();

        assert_eq!(config.queries, vec!["https://www.olx.pl/oferty/q-ps-tv/".to_string()]);
        assert_eq!(config.fetch_settings().request_timeout, Duration::from_secs(5));
        assert!(config.announce_summary);
        assert_eq!(config.telegram.chat_id.as_deref(), Some("from-env"));
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.markers.card, "li.offer");
        assert_eq!(config.markers.price, "p[data-testid='ad-price']");
        assert_eq!(config.seen_file, PathBuf::from("seen_ads.json"));
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let err = AppConfig::from_sources(Some("(queries: [1, 2"), env(&[])).unwrap_err();
        assert!(err.to_string().contains("malformed configuration file"));
    }

    #[test]
    fn relative_query_url_is_rejected() {
        let config =
            AppConfig::from_sources(None, env(&[("OLX_QUERIES", "/uk/list/q-tv/")])).unwrap();
        assert!(config.targets().is_err());
    }

    #[test]
    fn missing_credentials_do_not_fail_loading() {
        let config = AppConfig::from_sources(None, env(&[])).unwrap();
        assert!(!config.telegram_settings().token_format_valid());
    }
}
