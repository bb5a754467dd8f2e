//! Telegram Bot API client
//!
//! JSON requests against `https://api.telegram.org/bot<token>/`.
//! `send_message` is fire-and-forget from the caller's point of view;
//! `get_updates` long-polls for inbound commands.

use std::time::Duration;

use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::{AppError, AppResult};

const CONNECT_TIMEOUT_SECS: u64 = 10;
// Must exceed the getUpdates long-poll timeout.
const REQUEST_TIMEOUT_SECS: u64 = 40;
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        let client = match reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Failed to build HTTP client with timeouts, using defaults");
                reqwest::Client::new()
            }
        };

        Self {
            client,
            base: format!("https://api.telegram.org/bot{token}"),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    /// Send a Markdown message to one chat.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        Self::check_reply::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Long-poll for new updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64) -> AppResult<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let response = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        let updates = Self::check_reply::<Vec<Update>>(response).await?;
        Ok(updates.unwrap_or_default())
    }

    /// Validate HTTP status and the `ok` envelope field.
    ///
    /// 401/403 map to `Forbidden` so callers can tell a bad bot token
    /// apart from transient failures.
    async fn check_reply<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> AppResult<Option<T>> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        let reply: ApiReply<T> = serde_json::from_str(&body)
            .map_err(|_| AppError::Telegram(format!("unexpected response: {body}")))?;

        if status.is_success() && reply.ok {
            return Ok(reply.result);
        }

        let description = reply
            .description
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            Err(AppError::Forbidden(description))
        } else {
            Err(AppError::Telegram(description))
        }
    }
}
