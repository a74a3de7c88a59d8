//! Email verification protocol
//!
//! `Unregistered -> PendingVerification -> Verified`. Registration stores the
//! user together with a verification token and mails a link; following the
//! link consumes the token.

use tracing::{info, instrument, warn};

use sudu_core::{DomainError, NewUser, User, UserId};
use sudu_notify::{render_template, Template};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// A freshly registered account
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// Whether the verification email reached the transport
    pub email_sent: bool,
}

/// Email verification service
pub struct VerificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create an unverified account and mail its verification link
    ///
    /// A failed send does not undo the registration.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<Registration> {
        let now = self.ctx.now();
        if self.ctx.user_repo().email_exists(email).await?
            || self.ctx.pending_repo().live_pending_exists(email, now).await?
        {
            return Err(DomainError::EmailAlreadyExists.into());
        }

        let password_hash = self.ctx.password_service().hash(password)?;
        let token = self.ctx.token_issuer().issue_opaque_token();

        let user = self
            .ctx
            .user_repo()
            .create(&NewUser::awaiting_verification(
                name.to_string(),
                email.to_string(),
                password_hash,
                token.clone(),
            ))
            .await?;

        info!(user_id = %user.id, "User registered, awaiting email verification");

        let link = self.ctx.settings().verification_link(&token);
        let rendered = render_template(&Template::VerifyEmail { link: &link });
        let email_sent = match self
            .ctx
            .notifier()
            .send_email(&user.email, rendered.subject, &rendered.body)
            .await
        {
            Ok(message_id) => {
                info!(user_id = %user.id, message_id = %message_id, "Verification email sent");
                true
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to send verification email");
                false
            }
        };

        Ok(Registration { user, email_sent })
    }

    /// Consume a verification token
    ///
    /// Unknown, already used and never issued tokens are one error.
    #[instrument(skip_all)]
    pub async fn confirm_verification(&self, token: &str) -> ServiceResult<UserId> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::InvalidOrExpiredToken.into());
        }

        let user_id = self
            .ctx
            .email_token_repo()
            .consume_verification_token(token)
            .await?
            .ok_or(DomainError::InvalidOrExpiredToken)?;

        info!(user_id = %user_id, "Email verified");
        Ok(user_id)
    }
}
