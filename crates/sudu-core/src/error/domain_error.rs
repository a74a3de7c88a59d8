//! Domain errors - the authentication error taxonomy

use thiserror::Error;

use super::NotificationError;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Пользователь не найден")]
    UserNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Ошибка валидации: {0}")]
    ValidationError(String),

    #[error("Недействительная или просроченная ссылка")]
    InvalidOrExpiredToken,

    #[error("Неверный или просроченный код")]
    InvalidOrExpiredCode,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Пользователь с таким email уже существует")]
    EmailAlreadyExists,

    #[error("Telegram уже привязан к этому аккаунту")]
    TelegramAlreadyLinked,

    #[error("Этот Telegram уже привязан к другому аккаунту")]
    ChatBoundToOtherUser,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Telegram не привязан к этому аккаунту")]
    TelegramNotLinked,

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Неверный email или пароль")]
    WrongCredentials,

    #[error("Подтвердите ваш email перед входом")]
    UnverifiedEmail,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Не удалось отправить сообщение: {0}")]
    TransportFailure(#[from] NotificationError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidOrExpiredToken => "INVALID_TOKEN",
            Self::InvalidOrExpiredCode => "INVALID_CODE",

            Self::EmailAlreadyExists => "DUPLICATE_EMAIL",
            Self::TelegramAlreadyLinked => "ALREADY_LINKED",
            Self::ChatBoundToOtherUser => "ALREADY_BOUND_TO_OTHER",

            Self::TelegramNotLinked => "NOT_LINKED",

            Self::WrongCredentials => "WRONG_CREDENTIALS",
            Self::UnverifiedEmail => "UNVERIFIED_EMAIL",

            Self::TransportFailure(_) => "TRANSPORT_FAILURE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound)
    }

    /// Check if this is a validation error (bad input, unusable token or code)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidOrExpiredToken | Self::InvalidOrExpiredCode
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists | Self::TelegramAlreadyLinked | Self::ChatBoundToOtherUser
        )
    }

    /// Check if this is an authentication error
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::WrongCredentials | Self::UnverifiedEmail)
    }

    /// Check if an outbound message could not be delivered
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportFailure(_))
    }

    /// Protocol rejections the client can act on; everything else is a server fault
    pub fn is_rejection(&self) -> bool {
        self.is_validation() || self.is_conflict() || matches!(self, Self::TelegramNotLinked)
    }
}
