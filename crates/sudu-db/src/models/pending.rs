//! Pending registration database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PendingRegistrationModel {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub link_code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
