//! In-memory `NotificationChannel` that records every message

use async_trait::async_trait;
use parking_lot::Mutex;

use sudu_core::{ChatId, MessageId, NotificationChannel, NotificationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Email {
        to: String,
        subject: String,
        html: String,
        message_id: MessageId,
    },
    Telegram {
        chat_id: ChatId,
        text: String,
    },
}

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<SentMessage>,
    fail_email: bool,
    fail_telegram: bool,
}

/// Keeps sent messages in memory. Either transport can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    outbox: Mutex<Outbox>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_email(&self, fail: bool) {
        self.outbox.lock().fail_email = fail;
    }

    pub fn fail_telegram(&self, fail: bool) {
        self.outbox.lock().fail_telegram = fail;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox.lock().sent.clone()
    }

    /// HTML bodies of emails sent to `to`, oldest first
    pub fn emails_to(&self, to: &str) -> Vec<String> {
        self.outbox
            .lock()
            .sent
            .iter()
            .filter_map(|m| match m {
                SentMessage::Email { to: addr, html, .. } if addr == to => Some(html.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts sent to a chat, oldest first
    pub fn telegram_to(&self, chat_id: ChatId) -> Vec<String> {
        self.outbox
            .lock()
            .sent
            .iter()
            .filter_map(|m| match m {
                SentMessage::Telegram { chat_id: id, text } if *id == chat_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.outbox.lock().sent.clear();
    }
}

#[async_trait]
impl NotificationChannel for RecordingNotifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<MessageId, NotificationError> {
        let mut outbox = self.outbox.lock();
        if outbox.fail_email {
            return Err(NotificationError::Email("simulated SMTP failure".to_string()));
        }
        let message_id = format!("<{}@outbox>", outbox.sent.len() + 1);
        outbox.sent.push(SentMessage::Email {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
            message_id: message_id.clone(),
        });
        Ok(message_id)
    }

    async fn send_telegram(&self, chat_id: ChatId, text: &str) -> Result<(), NotificationError> {
        let mut outbox = self.outbox.lock();
        if outbox.fail_telegram {
            return Err(NotificationError::Telegram(
                "Forbidden: bot was blocked by the user".to_string(),
            ));
        }
        outbox.sent.push(SentMessage::Telegram {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }
}
