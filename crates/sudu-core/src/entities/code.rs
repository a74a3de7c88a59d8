//! One-time numeric codes for account linking and password recovery

use chrono::{DateTime, Utc};

use super::User;
use crate::value_objects::UserId;

/// What a one-time code authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePurpose {
    /// Bind a Telegram chat to an existing account
    AccountLink,
    /// Reset the password of a Telegram-linked account
    PasswordRecovery,
}

impl CodePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountLink => "account_link",
            Self::PasswordRecovery => "password_recovery",
        }
    }
}

impl std::fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted one-time code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub id: i64,
    pub user_id: UserId,
    pub purpose: CodePurpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl OneTimeCode {
    /// Expiry is exclusive: a code is dead at exactly `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A code can be consumed only while unused and unexpired
    pub fn is_consumable_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired_at(now)
    }
}

/// Insert payload for a one-time code
#[derive(Debug, Clone)]
pub struct NewOneTimeCode {
    pub user_id: UserId,
    pub purpose: CodePurpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of claiming an account-link code for a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatBinding {
    /// The chat is now bound to the code's owner
    Linked(User),
    /// The owner was already bound to this very chat
    AlreadyLinked(User),
}

impl ChatBinding {
    pub fn user(&self) -> &User {
        match self {
            Self::Linked(user) | Self::AlreadyLinked(user) => user,
        }
    }
}
