//! Telegram account link protocol
//!
//! `Unlinked -> LinkRequested -> Linked`. A link code comes either from an
//! existing account (`request_link`) or from a registration held in the
//! pending table (`register_pending`). The bot confirms the code with the
//! chat it was sent from.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use sudu_core::{
    ChatBinding, ChatId, CodePurpose, DomainError, NewOneTimeCode, NewPendingRegistration, User,
};
use sudu_notify::{render_template, Template};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Attempts at drawing a pending link code that no live registration holds
const LINK_CODE_ATTEMPTS: usize = 5;

/// A link code handed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    /// Seconds until the code expires
    pub expires_in: i64,
}

/// Result of confirming a link code from a chat
#[derive(Debug, Clone)]
pub enum LinkOutcome {
    /// A pending registration became an account bound to the chat
    NewUserLinked(User),
    /// An existing account was bound to the chat
    ExistingUserLinked(User),
    /// The account was already bound to this chat
    AlreadyLinked(User),
}

impl LinkOutcome {
    pub fn user(&self) -> &User {
        match self {
            Self::NewUserLinked(user) | Self::ExistingUserLinked(user) | Self::AlreadyLinked(user) => {
                user
            }
        }
    }

    pub fn already_linked(&self) -> bool {
        matches!(self, Self::AlreadyLinked(_))
    }
}

/// Telegram link service
pub struct TelegramLinkService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TelegramLinkService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue an account link code for an existing, unlinked account
    #[instrument(skip_all, fields(email = %email))]
    pub async fn request_link(&self, email: &str) -> ServiceResult<IssuedCode> {
        let user = self
            .ctx
            .user_repo()
            .find_by_email(email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if user.is_telegram_linked() {
            return Err(DomainError::TelegramAlreadyLinked.into());
        }

        let ttl = self.ctx.settings().link_code_ttl;
        let code = self.ctx.token_issuer().issue_numeric_code();
        self.ctx
            .code_repo()
            .create_code(&NewOneTimeCode {
                user_id: user.id,
                purpose: CodePurpose::AccountLink,
                code: code.clone(),
                expires_at: self.ctx.now() + ttl,
            })
            .await?;

        info!(user_id = %user.id, "Telegram link code issued");
        Ok(IssuedCode {
            code,
            expires_in: ttl.num_seconds(),
        })
    }

    /// Hold a registration until a chat confirms its link code
    #[instrument(skip_all, fields(email = %email))]
    pub async fn register_pending(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<IssuedCode> {
        let now = self.ctx.now();
        if self.ctx.user_repo().email_exists(email).await?
            || self.ctx.pending_repo().live_pending_exists(email, now).await?
        {
            return Err(DomainError::EmailAlreadyExists.into());
        }

        let password_hash = self.ctx.password_service().hash(password)?;
        let link_code = self.fresh_pending_code(now).await?;
        let ttl = self.ctx.settings().pending_registration_ttl;

        self.ctx
            .pending_repo()
            .create_pending(
                &NewPendingRegistration {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash,
                    link_code: link_code.clone(),
                    expires_at: now + ttl,
                },
                now,
            )
            .await?;

        info!("Pending registration created");
        Ok(IssuedCode {
            code: link_code,
            expires_in: ttl.num_seconds(),
        })
    }

    async fn fresh_pending_code(&self, now: DateTime<Utc>) -> ServiceResult<String> {
        let mut code = self.ctx.token_issuer().issue_numeric_code();
        for _ in 1..LINK_CODE_ATTEMPTS {
            if !self.ctx.pending_repo().link_code_in_use(&code, now).await? {
                break;
            }
            debug!("Pending link code collision, drawing again");
            code = self.ctx.token_issuer().issue_numeric_code();
        }
        Ok(code)
    }

    /// Confirm a link code from `chat_id`
    ///
    /// A pending registration holding the code wins over an account link
    /// code. Unknown, expired and used codes are one error.
    #[instrument(skip_all, fields(chat_id = %chat_id))]
    pub async fn confirm_link(&self, code: &str, chat_id: ChatId) -> ServiceResult<LinkOutcome> {
        let code = code.trim();
        if code.is_empty() {
            return Err(DomainError::InvalidOrExpiredCode.into());
        }
        let now = self.ctx.now();

        if let Some(user) = self
            .ctx
            .pending_repo()
            .promote_pending(code, chat_id, now)
            .await?
        {
            info!(user_id = %user.id, "Pending registration promoted");
            self.notify(
                chat_id,
                &Template::AccountCreated {
                    name: &user.name,
                    email: &user.email,
                },
            )
            .await;
            return Ok(LinkOutcome::NewUserLinked(user));
        }

        match self
            .ctx
            .code_repo()
            .bind_chat_with_code(code, chat_id, now)
            .await?
        {
            Some(ChatBinding::Linked(user)) => {
                info!(user_id = %user.id, "Telegram linked");
                self.notify(
                    chat_id,
                    &Template::LinkWelcome {
                        name: &user.name,
                        email: &user.email,
                    },
                )
                .await;
                Ok(LinkOutcome::ExistingUserLinked(user))
            }
            Some(ChatBinding::AlreadyLinked(user)) => {
                info!(user_id = %user.id, "Telegram already linked to this chat");
                Ok(LinkOutcome::AlreadyLinked(user))
            }
            None => Err(DomainError::InvalidOrExpiredCode.into()),
        }
    }

    /// Whether the account behind `email` has a linked chat. Unknown
    /// addresses read as unlinked.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn check_link(&self, email: &str) -> ServiceResult<bool> {
        Ok(self
            .ctx
            .user_repo()
            .find_by_email(email)
            .await?
            .is_some_and(|user| user.is_telegram_linked()))
    }

    async fn notify(&self, chat_id: ChatId, template: &Template<'_>) {
        let rendered = render_template(template);
        if let Err(e) = self.ctx.notifier().send_telegram(chat_id, &rendered.body).await {
            warn!(chat_id = %chat_id, kind = rendered.subject, error = %e, "Failed to send Telegram message");
        }
    }
}
