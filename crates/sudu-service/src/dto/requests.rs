//! Request DTOs for API endpoints
//!
//! Missing fields deserialize as empty strings so that they fail validation
//! with a readable message instead of a JSON error.

use serde::Deserialize;
use validator::Validate;

use sudu_core::ChatId;

use crate::services::{ResetProof, ServiceError, ServiceResult};

const FIELDS_REQUIRED: &str = "Все поля обязательны для заполнения";

// ============================================================================
// Registration / login
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, alias = "name")]
    #[validate(length(min = 1, message = "Все поля обязательны для заполнения"))]
    pub full_name: String,

    #[serde(default)]
    #[validate(email(message = "Некорректный email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Все поля обязательны для заполнения"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Введите email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Введите пароль"))]
    pub password: String,
}

// ============================================================================
// Recovery
// ============================================================================

/// Body of every endpoint that takes only an email address
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailRequest {
    #[serde(default)]
    #[validate(email(message = "Некорректный email"))]
    pub email: String,
}

/// Either `{token, newPassword}` or `{email, code, newPassword}`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default, rename = "newPassword", alias = "new_password")]
    #[validate(length(min = 1, message = "Введите новый пароль"))]
    pub new_password: String,
}

impl ResetPasswordRequest {
    /// Which proof of channel control the request carries. A token wins
    /// over an email and code pair.
    pub fn proof(&self) -> ServiceResult<ResetProof> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match (non_empty(&self.token), non_empty(&self.email), non_empty(&self.code)) {
            (Some(token), _, _) => Ok(ResetProof::Token(token)),
            (None, Some(email), Some(code)) => Ok(ResetProof::Code { email, code }),
            _ => Err(ServiceError::validation(FIELDS_REQUIRED)),
        }
    }
}

// ============================================================================
// Telegram link
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmLinkRequest {
    #[serde(default, rename = "linkCode", alias = "link_code")]
    #[validate(length(min = 1, message = "Введите код привязки"))]
    pub link_code: String,

    pub telegram_chat_id: ChatId,
}
