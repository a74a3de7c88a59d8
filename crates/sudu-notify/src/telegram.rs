//! Telegram Bot API client (sendMessage, getUpdates, getMe)

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};

use sudu_common::TelegramConfig;
use sudu_core::{ChatId, NotificationError};

/// Slack added on top of the long-poll timeout before the HTTP request gives up
const POLL_GRACE: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Chat {
    pub fn chat_id(&self) -> ChatId {
        ChatId::new(self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

/// Thin client over the Bot API. The token is part of every URL, so request
/// errors are stripped of their URL before they are reported.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(api_base: &str, bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
        }
    }

    /// Client for a configuration that carries a bot token
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        config
            .bot_token
            .as_deref()
            .map(|token| Self::new(&config.api_base, token))
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, NotificationError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}/{method}", self.endpoint))
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| NotificationError::Telegram(e.without_url().to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| NotificationError::Telegram(e.without_url().to_string()))?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(NotificationError::Telegram(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    #[instrument(skip(self, text))]
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), NotificationError> {
        let body = SendMessage {
            chat_id: chat_id.into_inner(),
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let _: serde_json::Value = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        debug!("Telegram message sent");
        Ok(())
    }

    /// Long-poll for new messages
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotificationError> {
        let body = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        self.call(
            "getUpdates",
            &body,
            Duration::from_secs(timeout_secs) + POLL_GRACE,
        )
        .await
    }

    pub async fn get_me(&self) -> Result<BotUser, NotificationError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT).await
    }
}
