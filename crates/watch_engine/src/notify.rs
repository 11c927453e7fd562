use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use watch_core::{format_listing_message, ListingRecord};
use watch_logging::{watch_debug, watch_error, watch_info, watch_warn};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

/// Delivers a text message to the configured destination.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    /// `true` when the message was accepted. Failures are logged by the
    /// implementation.
    async fn send_message(&self, text: &str, parse_mode: Option<ParseMode>) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendFailure {
    #[error("bot token format looks invalid (expected '123456789:...')")]
    InvalidToken,
    #[error("no chat id configured")]
    MissingChatId,
    #[error("404 Not Found; check the bot token and endpoint. Response: {0}")]
    NotFound(String),
    #[error(
        "403 Forbidden; the chat has not started the bot, the chat id points to a bot, \
         or the bot lacks permission in the chat. Response: {0}"
    )]
    Forbidden(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub timeout: Duration,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: None,
            chat_id: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl TelegramSettings {
    /// Tokens look like `123456789:AA...`.
    pub fn token_format_valid(&self) -> bool {
        self.bot_token
            .as_deref()
            .is_some_and(|token| !token.is_empty() && token.contains(':'))
    }

    /// The numeric bot id in front of the token's colon.
    pub fn bot_id(&self) -> Option<&str> {
        self.bot_token
            .as_deref()
            .and_then(|token| token.split_once(':'))
            .map(|(id, _)| id)
    }

    /// Sending to the bot's own id is a common misconfiguration.
    pub fn chat_is_bot_itself(&self) -> bool {
        matches!((self.chat_id.as_deref(), self.bot_id()), (Some(chat), Some(bot)) if chat == bot)
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

/// Telegram Bot API `sendMessage` client.
pub struct TelegramMessenger {
    settings: TelegramSettings,
    client: reqwest::Client,
}

impl TelegramMessenger {
    pub fn new(settings: TelegramSettings) -> Result<Self, SendFailure> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| SendFailure::Transport(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &TelegramSettings {
        &self.settings
    }

    pub async fn try_send(&self, text: &str, parse_mode: Option<ParseMode>) -> Result<(), SendFailure> {
        let token = self
            .settings
            .bot_token
            .as_deref()
            .filter(|token| token.contains(':'))
            .ok_or(SendFailure::InvalidToken)?;
        let chat_id = self
            .settings
            .chat_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(SendFailure::MissingChatId)?;

        let url = format!(
            "{}/bot{}/sendMessage",
            self.settings.api_base.trim_end_matches('/'),
            token
        );
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| SendFailure::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        let body = match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => payload.to_string(),
            Err(_) => raw.chars().take(200).collect(),
        };
        Err(match status {
            404 => SendFailure::NotFound(body),
            403 => SendFailure::Forbidden(body),
            _ => SendFailure::Status { status, body },
        })
    }
}

#[async_trait::async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(&self, text: &str, parse_mode: Option<ParseMode>) -> bool {
        match self.try_send(text, parse_mode).await {
            Ok(()) => {
                watch_debug!("Telegram message sent successfully");
                true
            }
            Err(err @ (SendFailure::InvalidToken | SendFailure::MissingChatId)) => {
                watch_error!(
                    "Telegram configuration problem: {}. Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID.",
                    err
                );
                false
            }
            Err(err @ SendFailure::Transport(_)) => {
                watch_error!("Telegram send exception: {}", err);
                false
            }
            Err(err) => {
                watch_warn!("Telegram send failed ({})", err);
                false
            }
        }
    }
}

/// Announces one listing. Delivery failures are logged, never retried.
pub async fn dispatch(record: &ListingRecord, messenger: &dyn Messenger) -> bool {
    let message = format_listing_message(record);
    let delivered = messenger
        .send_message(&message, Some(ParseMode::Markdown))
        .await;
    if delivered {
        watch_info!("Sent ad: {}", record.title);
    } else {
        watch_warn!("Failed to send ad: {}", record.title);
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::TelegramSettings;

    fn settings(token: Option<&str>, chat: Option<&str>) -> TelegramSettings {
        TelegramSettings {
            bot_token: token.map(str::to_string),
            chat_id: chat.map(str::to_string),
            ..TelegramSettings::default()
        }
    }

    #[test]
    fn token_needs_a_colon() {
        assert!(settings(Some("123456789:AAbb"), None).token_format_valid());
        assert!(!settings(Some("123456789"), None).token_format_valid());
        assert!(!settings(Some(""), None).token_format_valid());
        assert!(!settings(None, None).token_format_valid());
    }

    #[test]
    fn chat_equal_to_bot_id_is_detected() {
        assert!(settings(Some("42:abc"), Some("42")).chat_is_bot_itself());
        assert!(!settings(Some("42:abc"), Some("1001")).chat_is_bot_itself());
        assert!(!settings(None, Some("42")).chat_is_bot_itself());
    }
}
