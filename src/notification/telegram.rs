//! A client for sending alerts to a Telegram chat through the Bot API.

use crate::config::TelegramConfig;
use crate::core::{error_chain, DeliveryOutcome, Notifier};
use crate::escape::escape_markdown_v2;
use crate::internal_metrics;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

const PARSE_MODE: &str = "MarkdownV2";
const UNKNOWN_API_ERROR: &str = "Unknown error";

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: &'static str,
}

impl SendMessageRequest {
    /// Escapes `raw_message` and wraps it in a code block for `chat_id`.
    pub fn new(chat_id: &str, raw_message: &str) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            text: format!("```\n{}\n```", escape_markdown_v2(raw_message)),
            parse_mode: PARSE_MODE,
        }
    }
}

/// The parts of the Bot API response envelope we look at.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: Value,
    description: Option<String>,
}

impl ApiResponse {
    /// `ok` counts as success when it is truthy, not only when it is `true`.
    fn is_ok(&self) -> bool {
        match &self.ok {
            Value::Null => false,
            Value::Bool(ok) => *ok,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram credentials are not configured")]
    MissingCredentials,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("Telegram API rejected the message: {description}")]
    Rejected { description: String, body: String },

    #[error("unreadable Telegram API response (status {status})")]
    UnreadableResponse {
        status: StatusCode,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Sends alerts to the chat named in a [`TelegramConfig`].
///
/// Credentials are injected at construction and read on every call; a
/// notifier without credentials is valid and simply skips delivery.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier`.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Returns `(bot_token, chat_id)` if both are set and non-empty.
    fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.config.bot_token.as_deref().filter(|t| !t.is_empty())?;
        let chat_id = self.config.chat_id.as_deref().filter(|c| !c.is_empty())?;
        Some((token, chat_id))
    }

    /// Sends `raw_message`, reporting every failure as a `NotifyError`.
    pub async fn send(&self, raw_message: &str) -> Result<(), NotifyError> {
        let (token, chat_id) = self.credentials().ok_or(NotifyError::MissingCredentials)?;

        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            token
        );
        let payload = SendMessageRequest::new(chat_id, raw_message);

        // The request URL carries the bot token, keep it out of error messages.
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(api) if api.is_ok() => Ok(()),
            Ok(api) => Err(NotifyError::Rejected {
                description: api
                    .description
                    .unwrap_or_else(|| UNKNOWN_API_ERROR.to_string()),
                body,
            }),
            // The API accepted the call but answered with something that is
            // not an envelope at all.
            Err(_) if status.is_success() => Err(NotifyError::Rejected {
                description: UNKNOWN_API_ERROR.to_string(),
                body,
            }),
            Err(source) => Err(NotifyError::UnreadableResponse {
                status,
                body,
                source,
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip_all)]
    async fn notify(&self, raw_message: &str) -> DeliveryOutcome {
        let outcome = match self.send(raw_message).await {
            Ok(()) => {
                info!("Alert sent to Telegram.");
                DeliveryOutcome::Sent
            }
            Err(NotifyError::MissingCredentials) => {
                warn!("Telegram bot token or chat id is not configured, skipping notification.");
                DeliveryOutcome::Skipped
            }
            Err(NotifyError::Rejected { description, body }) => {
                error!(body = %body, "Telegram API rejected the message: {}", description);
                DeliveryOutcome::Rejected { description }
            }
            Err(e) => {
                if let NotifyError::UnreadableResponse { body, .. } = &e {
                    error!(body = %body, "Telegram API response body");
                }
                let error = error_chain(&e);
                error!(error = %error, "Failed to send Telegram notification");
                DeliveryOutcome::Failed { error }
            }
        };
        internal_metrics::record_notification(outcome.as_str());
        outcome
    }
}
