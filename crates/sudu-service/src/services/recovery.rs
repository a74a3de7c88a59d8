//! Password recovery protocol
//!
//! One protocol over two channels. The email channel mails a reset link with
//! a one hour token and never tells the caller whether the account exists.
//! The Telegram channel sends a six digit code to the linked chat and
//! reports unknown or unlinked accounts unless configured to conceal them.

use tracing::{info, instrument, warn};

use sudu_core::{CodePurpose, DomainError, NewOneTimeCode, User, UserId};
use sudu_notify::{render_template, Template};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Out-of-band channel a recovery runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChannel {
    Email,
    Telegram,
}

/// Evidence presented when setting the new password
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetProof {
    /// Token from the emailed link
    Token(String),
    /// Code delivered to the linked Telegram chat
    Code { email: String, code: String },
}

impl ResetProof {
    pub fn channel(&self) -> RecoveryChannel {
        match self {
            Self::Token(_) => RecoveryChannel::Email,
            Self::Code { .. } => RecoveryChannel::Telegram,
        }
    }
}

/// Password recovery service
pub struct RecoveryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RecoveryService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a reset token or code for `email` and deliver it
    #[instrument(skip(self, email), fields(email = %email))]
    pub async fn request_reset(&self, channel: RecoveryChannel, email: &str) -> ServiceResult<()> {
        let user = self.ctx.user_repo().find_by_email(email).await?;
        match channel {
            RecoveryChannel::Email => self.request_email_reset(user).await,
            RecoveryChannel::Telegram => self.request_telegram_reset(user).await,
        }
    }

    async fn request_email_reset(&self, user: Option<User>) -> ServiceResult<()> {
        let Some(user) = user else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let settings = self.ctx.settings();
        let token = self.ctx.token_issuer().issue_opaque_token();
        let expires_at = self.ctx.now() + settings.reset_token_ttl;
        self.ctx
            .email_token_repo()
            .store_reset_token(user.id, &token, expires_at)
            .await?;

        let link = settings.reset_link(&token);
        let rendered = render_template(&Template::PasswordReset {
            link: &link,
            ttl_minutes: settings.reset_token_ttl.num_minutes(),
        });
        match self
            .ctx
            .notifier()
            .send_email(&user.email, rendered.subject, &rendered.body)
            .await
        {
            Ok(message_id) => {
                info!(user_id = %user.id, message_id = %message_id, "Password reset email sent");
            }
            Err(e) => warn!(user_id = %user.id, error = %e, "Failed to send password reset email"),
        }
        Ok(())
    }

    async fn request_telegram_reset(&self, user: Option<User>) -> ServiceResult<()> {
        let conceal = self.ctx.settings().conceal_telegram_account_state;

        let Some(user) = user else {
            info!("Telegram recovery requested for unknown email");
            return if conceal {
                Ok(())
            } else {
                Err(DomainError::UserNotFound.into())
            };
        };
        let Some(chat_id) = user.telegram_chat_id else {
            info!(user_id = %user.id, "Telegram recovery requested for unlinked account");
            return if conceal {
                Ok(())
            } else {
                Err(DomainError::TelegramNotLinked.into())
            };
        };

        let ttl = self.ctx.settings().recovery_code_ttl;
        let code = self.ctx.token_issuer().issue_numeric_code();
        self.ctx
            .code_repo()
            .create_code(&NewOneTimeCode {
                user_id: user.id,
                purpose: CodePurpose::PasswordRecovery,
                code: code.clone(),
                expires_at: self.ctx.now() + ttl,
            })
            .await?;

        let rendered = render_template(&Template::RecoveryCode {
            code: &code,
            ttl_minutes: ttl.num_minutes(),
        });
        match self.ctx.notifier().send_telegram(chat_id, &rendered.body).await {
            Ok(()) => {
                info!(user_id = %user.id, "Recovery code sent to Telegram");
                Ok(())
            }
            Err(e) if conceal => {
                warn!(user_id = %user.id, error = %e, "Failed to send recovery code");
                Ok(())
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to send recovery code");
                Err(DomainError::TransportFailure(e).into())
            }
        }
    }

    /// Set a new password if the proof is live, consuming it
    #[instrument(skip_all, fields(channel = ?proof.channel()))]
    pub async fn reset_password(
        &self,
        proof: &ResetProof,
        new_password: &str,
    ) -> ServiceResult<UserId> {
        if new_password.is_empty() {
            return Err(ServiceError::validation("Введите новый пароль"));
        }

        let now = self.ctx.now();
        let password_hash = self.ctx.password_service().hash(new_password)?;

        let user_id = match proof {
            ResetProof::Token(token) => self
                .ctx
                .email_token_repo()
                .consume_reset_token(token, &password_hash, now)
                .await?
                .ok_or(DomainError::InvalidOrExpiredToken)?,
            ResetProof::Code { email, code } => self
                .ctx
                .code_repo()
                .consume_recovery_code(email, code.trim(), &password_hash, now)
                .await?
                .ok_or(DomainError::InvalidOrExpiredCode)?,
        };

        info!(user_id = %user_id, "Password changed");
        Ok(user_id)
    }
}
