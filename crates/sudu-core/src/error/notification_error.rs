//! Errors reported by outbound notification channels

use thiserror::Error;

/// Delivery failure of an email or Telegram message
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("email delivery failed: {0}")]
    Email(String),

    #[error("telegram delivery failed: {0}")]
    Telegram(String),

    #[error("{0} channel is not configured")]
    NotConfigured(&'static str),
}
