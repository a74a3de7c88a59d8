//! # sudu-notify
//!
//! Concrete `NotificationChannel` implementations and the message templates
//! the protocol layer renders before sending.
//!
//! - [`SmtpMailer`] delivers HTML email through `lettre`
//! - [`TelegramClient`] talks to the Telegram Bot API through `reqwest`
//! - [`Notifier`] combines both behind the `NotificationChannel` port
//! - [`RecordingNotifier`] keeps every message in memory

pub mod memory;
pub mod notifier;
pub mod smtp;
pub mod telegram;
pub mod templates;

pub use memory::{RecordingNotifier, SentMessage};
pub use notifier::Notifier;
pub use smtp::SmtpMailer;
pub use telegram::{BotUser, Chat, IncomingMessage, TelegramClient, Update};
pub use templates::{render_template, Rendered, Template};
