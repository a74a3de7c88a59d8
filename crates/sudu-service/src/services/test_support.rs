//! In-memory wiring for service tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use sudu_common::RegistrationMode;
use sudu_core::{ManualClock, RandomTokenIssuer, TokenIssuer};
use sudu_db::MemoryStore;
use sudu_notify::RecordingNotifier;

use super::{AuthSettings, ServiceContext};

/// Issues queued codes first, then random ones
#[derive(Default)]
pub struct ScriptedIssuer {
    codes: Mutex<VecDeque<String>>,
}

impl ScriptedIssuer {
    pub fn push_code(&self, code: &str) {
        self.codes.lock().unwrap().push_back(code.to_string());
    }
}

impl TokenIssuer for ScriptedIssuer {
    fn issue_opaque_token(&self) -> String {
        RandomTokenIssuer.issue_opaque_token()
    }

    fn issue_numeric_code(&self) -> String {
        self.codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RandomTokenIssuer.issue_numeric_code())
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub issuer: Arc<ScriptedIssuer>,
    pub ctx: ServiceContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(AuthSettings {
            public_url: "https://sudu.test".to_string(),
            ..AuthSettings::default()
        })
    }

    pub fn telegram_mode() -> Self {
        Self::with_settings(AuthSettings {
            public_url: "https://sudu.test".to_string(),
            registration_mode: RegistrationMode::Telegram,
            require_verified_email: false,
            ..AuthSettings::default()
        })
    }

    pub fn with_settings(settings: AuthSettings) -> Self {
        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let issuer = Arc::new(ScriptedIssuer::default());

        let ctx = ServiceContext::builder()
            .store(Arc::new(store.clone()))
            .notifier(notifier.clone())
            .clock(clock.clone())
            .token_issuer(issuer.clone())
            .settings(settings)
            .build()
            .unwrap();

        Self {
            store,
            notifier,
            clock,
            issuer,
            ctx,
        }
    }
}

/// Pull the `token=` value out of an emailed link
pub fn token_from_email(html: &str) -> String {
    let start = html.find("token=").expect("token in email") + "token=".len();
    html[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect()
}
