//! Test helpers for integration tests
//!
//! Provides the spawned test server, HTTP helpers and extraction of tokens
//! and codes from recorded messages.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use reqwest::{redirect, Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use sudu_api::{create_app, AppState};
use sudu_common::{AppConfig, RegistrationMode};
use sudu_core::{ChatId, ManualClock};
use sudu_db::MemoryStore;
use sudu_notify::RecordingNotifier;
use sudu_service::{AuthSettings, ServiceContext};

/// Public URL the emailed links point at
pub const PUBLIC_URL: &str = "https://sudu.test";

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Server in email registration mode
    pub async fn start() -> Result<Self> {
        Self::start_with_settings(test_settings(RegistrationMode::Email)).await
    }

    /// Server in Telegram registration mode
    pub async fn start_telegram_mode() -> Result<Self> {
        Self::start_with_settings(test_settings(RegistrationMode::Telegram)).await
    }

    pub async fn start_with_settings(settings: AuthSettings) -> Result<Self> {
        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let start = Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid start time"))?;
        let clock = Arc::new(ManualClock::new(start));

        let ctx = ServiceContext::builder()
            .store(Arc::new(store.clone()))
            .notifier(notifier.clone())
            .clock(clock.clone())
            .settings(settings)
            .build()?;

        let app = create_app(AppState::new(ctx, test_config()?));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        // Redirects are asserted on, not followed
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            addr,
            client,
            store,
            notifier,
            clock,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// POST and return status with the parsed JSON body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(StatusCode, Value)> {
        let response = self.post(path, body).await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    /// Move the service clock forward
    pub fn advance(&self, minutes: i64) {
        self.clock.advance(chrono::Duration::minutes(minutes));
    }

    /// Token from the most recent email sent to `to`
    pub fn last_email_token(&self, to: &str) -> Option<String> {
        self.notifier
            .emails_to(to)
            .last()
            .and_then(|html| token_from_email(html))
    }

    /// Code from the most recent Telegram message sent to `chat_id`
    pub fn last_telegram_code(&self, chat_id: i64) -> Option<String> {
        self.notifier
            .telegram_to(ChatId::new(chat_id))
            .last()
            .and_then(|text| code_from_telegram(text))
    }
}

/// Auth settings with test-friendly URL
pub fn test_settings(mode: RegistrationMode) -> AuthSettings {
    AuthSettings {
        public_url: PUBLIC_URL.to_string(),
        registration_mode: mode,
        require_verified_email: mode == RegistrationMode::Email,
        ..AuthSettings::default()
    }
}

/// Configuration for the router layers; the store URL is never dialled
pub fn test_config() -> Result<AppConfig> {
    AppConfig::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://unused/sudu_test".to_string()),
        "PUBLIC_URL" => Some(PUBLIC_URL.to_string()),
        _ => None,
    })
    .map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Pull the `token=` value out of an emailed link
pub fn token_from_email(html: &str) -> Option<String> {
    let start = html.find("token=")? + "token=".len();
    let token: String = html[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();
    (!token.is_empty()).then_some(token)
}

/// Pull the code out of `<code>…</code>` in a Telegram message
pub fn code_from_telegram(text: &str) -> Option<String> {
    let start = text.find("<code>")? + "<code>".len();
    let end = start + text[start..].find("</code>")?;
    Some(text[start..end].to_string())
}

/// Assert response status and parse JSON body
pub async fn assert_json(response: Response, expected_status: StatusCode) -> Result<Value> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert an error body: status, `success:false` and the error code
pub async fn assert_error(
    response: Response,
    expected_status: StatusCode,
    expected_code: &str,
) -> Result<Value> {
    let body = assert_json(response, expected_status).await?;
    anyhow::ensure!(body["success"] == false, "success should be false: {body}");
    anyhow::ensure!(
        body["code"] == expected_code,
        "expected code {expected_code}: {body}"
    );
    Ok(body)
}
