//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Public columns of the `users` table. Secrets (password, tokens) are
/// selected separately where needed.
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub telegram_chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
