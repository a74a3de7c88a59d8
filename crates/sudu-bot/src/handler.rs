//! Turns an incoming chat message into a reply

use tracing::{info, instrument, warn};

use sudu_core::ChatId;
use sudu_service::{LinkOutcome, ServiceContext, TelegramLinkService};

use crate::commands::{parse_command, Command};
use crate::replies;

/// Command handler bound to the service context
#[derive(Debug, Clone)]
pub struct BotHandler {
    ctx: ServiceContext,
    bot_username: Option<String>,
}

impl BotHandler {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            bot_username: None,
        }
    }

    /// Username from `getMe`, used to skip commands meant for other bots
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Reply to send back, if any
    ///
    /// Successful links get no reply here; the link protocol already sent
    /// its welcome message to the chat.
    #[instrument(skip(self, text), fields(chat_id = %chat_id))]
    pub async fn handle(&self, chat_id: ChatId, text: &str) -> Option<String> {
        match parse_command(text, self.bot_username.as_deref()) {
            Command::Start => Some(replies::start()),
            Command::Help => Some(replies::help()),
            Command::Status => Some(self.status(chat_id).await),
            Command::Link(None) => Some(replies::link_usage()),
            Command::Link(Some(code)) => self.link(chat_id, &code).await,
            Command::Unknown(name) => Some(replies::unknown_command(&name)),
            Command::Text => Some(replies::text_hint()),
            Command::Ignored => None,
        }
    }

    async fn link(&self, chat_id: ChatId, code: &str) -> Option<String> {
        info!("Link code received");
        match TelegramLinkService::new(&self.ctx)
            .confirm_link(code, chat_id)
            .await
        {
            Ok(LinkOutcome::AlreadyLinked(user)) => {
                Some(replies::already_linked(&user.name, &user.email))
            }
            Ok(LinkOutcome::NewUserLinked(_) | LinkOutcome::ExistingUserLinked(_)) => None,
            Err(e) => {
                warn!(error = %e, "Link confirmation failed");
                Some(replies::link_failed(&e))
            }
        }
    }

    /// Store health plus the account this chat is linked to
    async fn status(&self, chat_id: ChatId) -> String {
        match self.ctx.user_repo().find_by_chat_id(chat_id).await {
            Ok(user) => replies::status(
                true,
                user.as_ref().map(|u| u.email.as_str()),
                self.ctx.now(),
            ),
            Err(e) => {
                warn!(error = %e, "Store unreachable");
                replies::status(false, None, self.ctx.now())
            }
        }
    }
}
