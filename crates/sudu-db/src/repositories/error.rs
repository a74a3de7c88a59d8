//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use sudu_core::error::DomainError;

/// Unique constraint on `users.telegram_chat_id`
pub const USERS_CHAT_ID_KEY: &str = "users_telegram_chat_id_key";

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Map a failed write to `users` by the unique constraint that tripped
pub fn map_user_write_error(e: SqlxError) -> DomainError {
    let chat_conflict = e
        .as_database_error()
        .and_then(|db_err| db_err.constraint())
        .is_some_and(|constraint| constraint == USERS_CHAT_ID_KEY);

    map_unique_violation(e, || {
        if chat_conflict {
            DomainError::ChatBoundToOtherUser
        } else {
            DomainError::EmailAlreadyExists
        }
    })
}
