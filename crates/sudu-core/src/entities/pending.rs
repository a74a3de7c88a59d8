//! Pending registration - an account held until a Telegram chat claims it

use chrono::{DateTime, Utc};

/// A registration waiting for its link code to be confirmed from Telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub link_code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PendingRegistration {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Insert payload for a pending registration
#[derive(Debug, Clone)]
pub struct NewPendingRegistration {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub link_code: String,
    pub expires_at: DateTime<Utc>,
}
