//! Outbound notification port

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::value_objects::ChatId;

/// Transport-assigned identifier of a sent email
pub type MessageId = String;

/// Capability to reach a user out of band.
///
/// Protocol code only ever holds this trait; the composition root decides
/// which transports sit behind it.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<MessageId, NotificationError>;

    async fn send_telegram(&self, chat_id: ChatId, text: &str) -> Result<(), NotificationError>;
}
