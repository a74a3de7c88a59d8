//! SMTP delivery through lettre's async transport

use std::time::Duration;

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use sudu_common::EmailConfig;
use sudu_core::{MessageId, NotificationError};

/// Port on which the server expects TLS from the first byte
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Domain part used for generated Message-IDs
    domain: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let relay = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        };
        let builder = relay
            .map_err(|e| NotificationError::Email(format!("invalid SMTP relay: {e}")))?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(10)));

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        let address = config
            .from_address
            .parse()
            .map_err(|e| NotificationError::Email(format!("invalid sender address: {e}")))?;
        let from = Mailbox::new(Some(config.from_name.clone()), address);
        let domain = config
            .from_address
            .rsplit_once('@')
            .map_or_else(|| "localhost".to_string(), |(_, d)| d.to_string());

        Ok(Self {
            transport: builder.build(),
            from,
            domain,
        })
    }

    #[instrument(skip(self, html), fields(to = %to))]
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<MessageId, NotificationError> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| NotificationError::Email(format!("invalid recipient address: {e}")))?;
        let message_id = format!("<{}@{}>", uuid::Uuid::new_v4(), self.domain);

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| NotificationError::Email(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Email(e.to_string()))?;

        info!(message_id = %message_id, "Email sent");
        Ok(message_id)
    }
}
