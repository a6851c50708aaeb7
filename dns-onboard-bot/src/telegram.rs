//! Telegram Bot API transport
//!
//! Long-polls `getUpdates` for incoming text and implements [`MessageSink`]
//! over `sendMessage`. The bot token is part of every request URL, so all
//! error text passes through [`redact_secret`] before it leaves this module.

use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use dns_onboard_core::types::{ApiToken, SessionId};
use dns_onboard_core::{CoreError, CoreResult, MessageSink};
use dns_onboard_provider::log_sanitizer::{redact_secret, truncate_for_log};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Seconds the server holds a `getUpdates` call open.
const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Client timeout, longer than the long poll.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// Telegram rejects messages longer than this (in characters).
const MAX_MESSAGE_CHARS: usize = 4096;

// ============ Wire types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// One incoming update. Only text messages are of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl Update {
    /// Chat and text of a text message, if this update carries one.
    pub fn text_message(&self) -> Option<(SessionId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((SessionId::from(message.chat.id), text))
    }
}

// ============ Client ============

/// Minimal Telegram Bot API client.
pub struct TelegramClient {
    client: reqwest::Client,
    token: ApiToken,
    api_base: String,
}

impl TelegramClient {
    pub fn new(token: ApiToken, api_base: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            token,
            api_base: api_base
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token.expose())
    }

    fn redact(&self, text: &str) -> String {
        redact_secret(text, self.token.expose())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("{method} request failed: {}", self.redact(&e.to_string())))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| anyhow!("{method} body read failed: {}", self.redact(&e.to_string())))?;
        tracing::trace!("[telegram] {method} -> HTTP {status}: {}", truncate_for_log(&text));

        decode_response(method, &text).map_err(|e| anyhow!(self.redact(&e.to_string())))
    }

    /// Fetch updates after `offset`, waiting up to the long-poll timeout.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: LONG_POLL_TIMEOUT_SECS,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request).await
    }

    pub async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let text = truncate_chars(text, MAX_MESSAGE_CHARS);
        let request = SendMessageRequest {
            chat_id,
            text: &text,
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn send_message(&self, session: &SessionId, text: &str) -> CoreResult<()> {
        self.send_text(session.as_str(), text)
            .await
            .map_err(|e| CoreError::Notification(e.to_string()))
    }
}

/// Decode a Bot API response body into its `result`.
fn decode_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let response: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| anyhow!("{method}: invalid response ({e}): {}", truncate_for_log(body)))?;

    if !response.ok {
        let code = response
            .error_code
            .map_or_else(|| "?".to_string(), |c| c.to_string());
        let description = response.description.unwrap_or_default();
        return Err(match response.parameters.and_then(|p| p.retry_after) {
            Some(secs) => anyhow!("{method} failed ({code}): {description}, retry after {secs}s"),
            None => anyhow!("{method} failed ({code}): {description}"),
        });
    }

    response
        .result
        .ok_or_else(|| anyhow!("{method}: response has no result"))
}

/// At most `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((idx, _)) => std::borrow::Cow::Owned(text[..idx].to_string()),
        None => std::borrow::Cow::Borrowed(text),
    }
}
