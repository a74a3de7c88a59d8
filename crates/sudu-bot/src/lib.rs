//! # sudu-bot
//!
//! Telegram side of account linking. The bot long-polls the Bot API,
//! parses commands and confirms link codes through the in-process
//! `TelegramLinkService`; replies go out through the shared
//! `NotificationChannel`.

pub mod commands;
pub mod handler;
pub mod poller;
pub mod replies;

pub use commands::{parse_command, Command};
pub use handler::BotHandler;
pub use poller::BotPoller;
