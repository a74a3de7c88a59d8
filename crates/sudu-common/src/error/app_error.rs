//! Application error types
//!
//! Unified error handling for the entire application.

use serde::Serialize;
use sudu_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Validation errors
    #[error("Ошибка валидации: {0}")]
    Validation(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => 500,

            Self::Domain(e) => Self::status_code_for(e),
        }
    }

    /// HTTP status for a domain error
    #[must_use]
    pub fn status_code_for(e: &DomainError) -> u16 {
        if e.is_not_found() {
            404
        } else if e.is_authentication() {
            401
        } else if e.is_rejection() {
            400
        } else if e.is_transport() {
            502
        } else {
            500
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Message safe to show a client. Server faults never leak their detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status_code() {
            502 => "Не удалось доставить сообщение, попробуйте позже".to_string(),
            500..=599 => "Ошибка сервера".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error body returned by the HTTP boundary: `{success:false, error, code}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            error: err.public_message(),
            code: err.error_code().to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sudu_core::NotificationError;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Validation("x".to_string()).status_code(), 400);
        assert_eq!(AppError::Config("bad".to_string()).status_code(), 500);
        assert_eq!(AppError::Database("down".to_string()).status_code(), 500);
    }

    #[test]
    fn test_domain_status_codes() {
        let cases = [
            (DomainError::EmailAlreadyExists, 400),
            (DomainError::InvalidOrExpiredToken, 400),
            (DomainError::InvalidOrExpiredCode, 400),
            (DomainError::TelegramAlreadyLinked, 400),
            (DomainError::ChatBoundToOtherUser, 400),
            (DomainError::TelegramNotLinked, 400),
            (DomainError::UserNotFound, 404),
            (DomainError::WrongCredentials, 401),
            (DomainError::UnverifiedEmail, 401),
            (
                DomainError::TransportFailure(NotificationError::Telegram("x".to_string())),
                502,
            ),
            (DomainError::DatabaseError("x".to_string()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::Domain(err).status_code(), status);
        }
    }

    #[test]
    fn test_error_response_hides_server_detail() {
        let err = AppError::Domain(DomainError::DatabaseError(
            "connection refused 10.0.0.3:5432".to_string(),
        ));
        let response = ErrorResponse::from(&err);

        assert!(!response.success);
        assert_eq!(response.code, "DATABASE_ERROR");
        assert_eq!(response.error, "Ошибка сервера");
    }

    #[test]
    fn test_error_response_keeps_rejection_message() {
        let response = ErrorResponse::from(AppError::Domain(DomainError::EmailAlreadyExists));
        assert_eq!(response.code, "DUPLICATE_EMAIL");
        assert_eq!(response.error, "Пользователь с таким email уже существует");
    }

    #[test]
    fn test_internal_wraps_source() {
        let err = AppError::internal(anyhow::anyhow!("hasher exploded"));
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(err.public_message(), "Ошибка сервера");
    }
}
