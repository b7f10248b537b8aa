//! Telegram Bot API sink.
//!
//! Sends each notification with `sendMessage`. A non-2xx status or a body
//! with `"ok": false` is a failed delivery; there are no retries.

use crate::error::{NotifyError, NotifyResult};
use crate::formatter::NotificationPayload;
use crate::sink::DispatchSink;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Without one the service runs in dry-run mode.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Destination chat (numeric id or `@channel`).
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Bot API base URL. Default: "https://api.telegram.org".
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Request timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: default_api_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl TelegramConfig {
    /// Bot token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.bot_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Chat id, ignoring blank values.
    pub fn chat(&self) -> Option<&str> {
        self.chat_id.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram sink.
pub struct TelegramSink {
    client: Client,
    /// `{base}/bot{token}/sendMessage`. Contains the token; never log it.
    endpoint: String,
    chat_id: String,
}

impl TelegramSink {
    /// Create a sink from configuration. Token and chat id are required.
    pub fn new(config: &TelegramConfig) -> NotifyResult<Self> {
        let token = config
            .token()
            .ok_or_else(|| NotifyError::NotConfigured("telegram.bot_token".to_string()))?;
        let chat_id = config
            .chat()
            .ok_or_else(|| NotifyError::NotConfigured("telegram.chat_id".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{token}/sendMessage",
                config.api_base_url.trim_end_matches('/')
            ),
            chat_id: chat_id.to_string(),
        })
    }
}

#[async_trait]
impl DispatchSink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn deliver(&self, payload: &NotificationPayload) -> NotifyResult<()> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &payload.text,
            parse_mode: payload.emphasis_markup.then_some("Markdown"),
            disable_notification: payload.silent,
        };

        debug!(chat_id = %self.chat_id, silent = payload.silent, "Sending Telegram message");

        // Errors carry the request URL, which embeds the token
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let description = parsed
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(NotifyError::Api {
                status: status.as_u16(),
                description,
            });
        }

        match parsed {
            Some(ApiResponse { ok: true, .. }) => {
                debug!(chat_id = %self.chat_id, "Telegram message sent");
                Ok(())
            }
            Some(ApiResponse { description, .. }) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "ok: false".to_string()),
            }),
            None => Err(NotifyError::Api {
                status: status.as_u16(),
                description: format!("unreadable response body: {body}"),
            }),
        }
    }
}
