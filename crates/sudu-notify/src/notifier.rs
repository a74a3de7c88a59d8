//! Production `NotificationChannel`: SMTP for email, Bot API for Telegram

use async_trait::async_trait;
use tracing::{debug, warn};

use sudu_common::AppConfig;
use sudu_core::{ChatId, MessageId, NotificationChannel, NotificationError};

use crate::smtp::SmtpMailer;
use crate::telegram::TelegramClient;

/// Routes each message to its transport.
///
/// Without SMTP settings, email is written to the log with its link tokens
/// redacted and reported as not delivered. Without a bot token, Telegram
/// sends fail.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    mailer: Option<SmtpMailer>,
    telegram: Option<TelegramClient>,
}

impl Notifier {
    pub fn new(mailer: Option<SmtpMailer>, telegram: Option<TelegramClient>) -> Self {
        Self { mailer, telegram }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, NotificationError> {
        let mailer = match &config.email {
            Some(email) => Some(SmtpMailer::new(email)?),
            None => {
                warn!("SMTP is not configured, outgoing email will not be delivered");
                None
            }
        };
        let telegram = TelegramClient::from_config(&config.telegram);
        if telegram.is_none() {
            warn!("TELEGRAM_BOT_TOKEN is not set, Telegram delivery is disabled");
        }
        Ok(Self::new(mailer, telegram))
    }

    pub fn telegram(&self) -> Option<&TelegramClient> {
        self.telegram.as_ref()
    }
}

#[async_trait]
impl NotificationChannel for Notifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<MessageId, NotificationError> {
        match &self.mailer {
            Some(mailer) => mailer.send(to, subject, html).await,
            None => {
                warn!(to = %to, subject = %subject, "Email not delivered (SMTP not configured)");
                debug!(body = %redact_tokens(html), "Undelivered email body");
                Err(NotificationError::NotConfigured("email"))
            }
        }
    }

    async fn send_telegram(&self, chat_id: ChatId, text: &str) -> Result<(), NotificationError> {
        match &self.telegram {
            Some(client) => client.send_message(chat_id, text).await,
            None => Err(NotificationError::NotConfigured("telegram")),
        }
    }
}

/// Replace the value of every `token=` query parameter
fn redact_tokens(html: &str) -> String {
    const MARKER: &str = "token=";
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(pos) = rest.find(MARKER) {
        let (head, tail) = rest.split_at(pos + MARKER.len());
        out.push_str(head);
        out.push_str("[redacted]");
        let value_len = tail
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(tail.len());
        rest = &tail[value_len..];
    }
    out.push_str(rest);
    out
}
