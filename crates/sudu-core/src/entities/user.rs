//! User entity - a registered account

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::value_objects::{ChatId, UserId};

/// A registered account. The password hash never leaves the store layer
/// through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub telegram_chat_id: Option<ChatId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether a Telegram chat is bound to this account
    #[inline]
    pub fn is_telegram_linked(&self) -> bool {
        self.telegram_chat_id.is_some()
    }

    /// Whether `chat_id` is the chat bound to this account
    #[inline]
    pub fn is_bound_to(&self, chat_id: ChatId) -> bool {
        self.telegram_chat_id == Some(chat_id)
    }
}

/// Insert payload for a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub telegram_chat_id: Option<ChatId>,
}

impl NewUser {
    /// An account awaiting email verification
    pub fn awaiting_verification(
        name: String,
        email: String,
        password_hash: String,
        verification_token: String,
    ) -> Self {
        Self {
            name,
            email,
            password_hash,
            email_verified: false,
            verification_token: Some(verification_token),
            telegram_chat_id: None,
        }
    }
}
