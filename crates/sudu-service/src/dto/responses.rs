//! Response DTOs for API endpoints
//!
//! Every body carries `success: true`; failures are rendered by the
//! boundary as `{success:false, error, code}`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sudu_core::{User, UserId};

use crate::services::LinkOutcome;

/// `{success, message}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ============================================================================
// Registration / login
// ============================================================================

/// Answer to `POST /api/auth/register`; the shape depends on the
/// registration mode
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    Registered(RegisteredResponse),
    Pending(PendingRegistrationResponse),
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub success: bool,
    pub message: String,
    pub user_id: UserId,
}

impl RegisteredResponse {
    pub fn new(user_id: UserId, email_sent: bool) -> Self {
        let message = if email_sent {
            "Регистрация успешна! Проверьте ваш email для подтверждения."
        } else {
            "Регистрация успешна, но не удалось отправить email подтверждения."
        };
        Self {
            success: true,
            message: message.to_string(),
            user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PendingRegistrationResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "linkCode")]
    pub link_code: String,
    /// Seconds until the link code expires
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}

impl PendingRegistrationResponse {
    pub fn new(link_code: String, expires_in: i64) -> Self {
        Self {
            success: true,
            message: format!(
                "Почти готово! Отправьте боту команду /link {link_code} в течение {} минут, \
                 чтобы завершить регистрацию.",
                expires_in / 60
            ),
            link_code,
            expires_in,
        }
    }
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub telegram_linked: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            telegram_linked: user.is_telegram_linked(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

impl LoginResponse {
    pub fn new(user: &User) -> Self {
        Self {
            success: true,
            message: "Вход выполнен!".to_string(),
            user: UserResponse::from(user),
        }
    }
}

// ============================================================================
// Telegram link
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LinkCodeResponse {
    pub success: bool,
    #[serde(rename = "linkCode")]
    pub link_code: String,
    pub instructions: String,
    /// Seconds until the code expires
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}

impl LinkCodeResponse {
    pub fn new(link_code: String, expires_in: i64) -> Self {
        Self {
            success: true,
            instructions: format!(
                "Отправьте Telegram-боту СУДУ команду /link {link_code}. \
                 Код действителен {} минут.",
                expires_in / 60
            ),
            link_code,
            expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmLinkResponse {
    pub success: bool,
    pub email: String,
    pub name: String,
    pub already_linked: bool,
    pub message: String,
}

impl From<&LinkOutcome> for ConfirmLinkResponse {
    fn from(outcome: &LinkOutcome) -> Self {
        let message = match outcome {
            LinkOutcome::NewUserLinked(_) => "Регистрация завершена, Telegram привязан!",
            LinkOutcome::ExistingUserLinked(_) => "Telegram успешно привязан!",
            LinkOutcome::AlreadyLinked(_) => "Telegram уже привязан к этому аккаунту",
        };
        let user = outcome.user();
        Self {
            success: true,
            email: user.email.clone(),
            name: user.name.clone(),
            already_linked: outcome.already_linked(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckLinkResponse {
    pub success: bool,
    pub linked: bool,
}

impl CheckLinkResponse {
    pub fn new(linked: bool) -> Self {
        Self {
            success: true,
            linked,
        }
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn ok(timestamp: DateTime<Utc>) -> Self {
        Self {
            status: "OK",
            message: "Сервер работает!",
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_response_uses_camel_case_keys() {
        let body = serde_json::to_value(RegisterResponse::Pending(
            PendingRegistrationResponse::new("123456".to_string(), 900),
        ))
        .unwrap();
        assert_eq!(body["linkCode"], "123456");
        assert_eq!(body["expiresIn"], 900);
        assert_eq!(body["success"], true);
        assert!(body["message"].as_str().unwrap().contains("/link 123456"));
    }

    #[test]
    fn test_registered_response_keeps_user_id() {
        let body = serde_json::to_value(RegisterResponse::Registered(RegisteredResponse::new(
            UserId::new(7),
            false,
        )))
        .unwrap();
        assert_eq!(body["user_id"], 7);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("не удалось отправить"));
    }

    #[test]
    fn test_check_link_shape() {
        let body = serde_json::to_value(CheckLinkResponse::new(true)).unwrap();
        assert_eq!(body, json!({"success": true, "linked": true}));
    }
}
