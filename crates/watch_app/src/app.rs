use anyhow::Context;
use chrono::{Local, Utc};
use watch_core::{PersistOutcome, RunSummary};
use watch_engine::{
    JsonSeenStore, ListingExtractor, Messenger, ReqwestFetcher, Runner, SeenStore,
    TelegramMessenger, TelegramSettings,
};
use watch_logging::{watch_info, watch_warn};

use crate::config::AppConfig;

/// One complete polling cycle: load seen ids, run every query, report.
pub async fn run_single_cycle(config: &AppConfig) -> anyhow::Result<RunSummary> {
    let started = Utc::now();
    let targets = config.targets().context("invalid query configuration")?;
    let filter = config.keyword_filter();
    let extractor =
        ListingExtractor::new(&config.markers).context("invalid card marker configuration")?;
    let telegram = config.telegram_settings();

    watch_info!("Bot starting. Monitoring {} query URLs.", targets.len());
    log_credential_diagnostics(&telegram);
    if !filter.is_empty() {
        watch_info!("Required title keywords: {:?}", filter.keywords());
    }

    let fetcher = ReqwestFetcher::new(config.fetch_settings());
    let messenger =
        TelegramMessenger::new(telegram).context("failed to build Telegram HTTP client")?;
    let store = JsonSeenStore::new(&config.seen_file);

    if config.announce_start {
        let notice = format!("🤖 OLX bot started. Monitoring {} queries.", targets.len());
        if !messenger.send_message(&notice, None).await {
            watch_warn!("Failed to send start notice");
        }
    }

    let mut seen = store.load();
    watch_info!("Starting single check cycle…");
    let runner = Runner {
        fetcher: &fetcher,
        extractor: &extractor,
        messenger: &messenger,
        store: &store,
    };
    let summary = runner.run_once(&targets, &filter, &mut seen).await;

    if config.announce_summary {
        let notice = format!(
            "⏱️ Check complete at {}: {} new ad(s).",
            Local::now().format("%Y-%m-%d %H:%M"),
            summary.new_records
        );
        if !messenger.send_message(&notice, None).await {
            watch_warn!("Failed to send summary notice");
        }
    }

    log_summary(&summary);
    let elapsed = Utc::now() - started;
    watch_info!("Single run complete in {} ms.", elapsed.num_milliseconds());
    Ok(summary)
}

fn log_credential_diagnostics(telegram: &TelegramSettings) {
    watch_info!(
        "Telegram chat: {} | Token format valid: {}",
        telegram.chat_id.as_deref().unwrap_or("<unset>"),
        telegram.token_format_valid()
    );
    if telegram.chat_is_bot_itself() {
        watch_warn!(
            "CHAT_ID equals the bot's own ID ({}). Set CHAT_ID to your user/group ID, not the bot ID.",
            telegram.bot_id().unwrap_or_default()
        );
    }
}

fn log_summary(summary: &RunSummary) {
    for target in &summary.targets {
        match (&target.parsed, &target.source) {
            (Ok(count), Some(source)) if source.final_url != target.url => watch_info!(
                "URL done: {} | parsed={} | served from {}",
                target.url,
                count,
                source.final_url
            ),
            (Ok(count), _) => watch_info!("URL done: {} | parsed={}", target.url, count),
            (Err(err), _) => watch_warn!("URL failed: {} | {}", target.url, err),
        }
    }
    let persisted = match &summary.persist {
        PersistOutcome::Persisted => "saved".to_string(),
        PersistOutcome::Skipped => "unchanged".to_string(),
        PersistOutcome::Failed(err) => format!("save failed: {err}"),
    };
    watch_info!(
        "Summary: targets={} failed_targets={} candidates={} new={} delivered={} failed_deliveries={} seen_state={}",
        summary.targets.len(),
        summary.failed_targets(),
        summary.candidates,
        summary.new_records,
        summary.delivered,
        summary.failed_deliveries,
        persisted
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use watch_core::PersistOutcome;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::run_single_cycle;
    use crate::config::{AppConfig, TelegramConfig};

    const TOKEN: &str = "123456789:AAtest";

    const LIST_PAGE: &str = r#"<html><body><div data-cy="l-card" id="77"><div data-cy="ad-card-title"><a href="/d/ps-tv.html"><h4>PlayStation TV</h4></a><p data-testid="ad-price">900 грн.</p></div></div></body></html>"#;

    async fn list_server() -> MockServer {
        watch_logging::initialize_for_tests();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uk/list/q-playstation-tv/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(LIST_PAGE.as_bytes(), "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    async fn expect_post(server: &MockServer, needle: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_string_contains(needle))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(times)
            .mount(server)
            .await;
    }

    fn config(server: &MockServer, dir: &TempDir, token: Option<&str>) -> AppConfig {
        AppConfig {
            queries: vec![format!("{}/uk/list/q-playstation-tv/", server.uri())],
            seen_file: dir.path().join("seen_ads.json"),
            telegram: TelegramConfig {
                api_base: server.uri(),
                bot_token: token.map(str::to_string),
                chat_id: Some("555".to_string()),
            },
            ..AppConfig::default()
        }
    }

    fn seen_ids(dir: &TempDir) -> Vec<String> {
        let raw = std::fs::read_to_string(dir.path().join("seen_ads.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn notices_bracket_the_run_when_enabled() {
        let server = list_server().await;
        expect_post(&server, "OLX bot started. Monitoring 1 queries.", 1).await;
        expect_post(&server, "PlayStation TV", 1).await;
        expect_post(&server, "Check complete at", 1).await;
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            announce_start: true,
            announce_summary: true,
            ..config(&server, &dir, Some(TOKEN))
        };

        let summary = run_single_cycle(&config).await.unwrap();

        assert_eq!(summary.new_records, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.persist, PersistOutcome::Persisted);
        assert_eq!(seen_ids(&dir), vec!["77".to_string()]);
        let summary_notice = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|req| String::from_utf8(req.body).ok())
            .find(|body| body.contains("Check complete at"))
            .unwrap();
        assert!(summary_notice.contains("1 new ad(s)."));
    }

    #[tokio::test]
    async fn notices_stay_quiet_when_disabled() {
        let server = list_server().await;
        expect_post(&server, "OLX bot started", 0).await;
        expect_post(&server, "Check complete at", 0).await;
        expect_post(&server, "PlayStation TV", 1).await;
        let dir = TempDir::new().unwrap();
        let config = config(&server, &dir, Some(TOKEN));

        let summary = run_single_cycle(&config).await.unwrap();

        assert_eq!(summary.delivered, 1);
        assert_eq!(seen_ids(&dir), vec!["77".to_string()]);
    }

    #[tokio::test]
    async fn missing_token_still_fetches_and_persists() {
        let server = list_server().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            announce_start: true,
            announce_summary: true,
            ..config(&server, &dir, None)
        };

        let summary = run_single_cycle(&config).await.unwrap();

        assert_eq!(summary.new_records, 1);
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.failed_deliveries, 1);
        assert_eq!(summary.persist, PersistOutcome::Persisted);
        assert_eq!(seen_ids(&dir), vec!["77".to_string()]);
    }
}
