//! Authentication service
//!
//! Registration in the configured mode and password login.

use tracing::{info, instrument, warn};

use sudu_common::RegistrationMode;
use sudu_core::{DomainError, User};

use crate::dto::{
    LoginRequest, PendingRegistrationResponse, RegisterRequest, RegisterResponse,
    RegisteredResponse,
};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::telegram_link::TelegramLinkService;
use super::verification::VerificationService;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register through the email or the Telegram flow, whichever the
    /// deployment runs
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<RegisterResponse> {
        match self.ctx.settings().registration_mode {
            RegistrationMode::Email => {
                let registration = VerificationService::new(self.ctx)
                    .register(&request.full_name, &request.email, &request.password)
                    .await?;
                Ok(RegisterResponse::Registered(RegisteredResponse::new(
                    registration.user.id,
                    registration.email_sent,
                )))
            }
            RegistrationMode::Telegram => {
                let issued = TelegramLinkService::new(self.ctx)
                    .register_pending(&request.full_name, &request.email, &request.password)
                    .await?;
                Ok(RegisterResponse::Pending(PendingRegistrationResponse::new(
                    issued.code,
                    issued.expires_in,
                )))
            }
        }
    }

    /// Login with email and password
    ///
    /// Unknown email and wrong password are the same rejection. The
    /// verification gate is checked only after the password matched.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<User> {
        let user = self
            .ctx
            .user_repo()
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: user not found");
                DomainError::WrongCredentials
            })?;

        let password_hash = self
            .ctx
            .user_repo()
            .get_password_hash(user.id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user.id, "Login failed: no password hash");
                DomainError::WrongCredentials
            })?;

        if !self
            .ctx
            .password_service()
            .verify(&request.password, &password_hash)?
        {
            warn!(user_id = %user.id, "Login failed: invalid password");
            return Err(DomainError::WrongCredentials.into());
        }

        if self.ctx.settings().require_verified_email && !user.email_verified {
            warn!(user_id = %user.id, "Login refused: email not verified");
            return Err(DomainError::UnverifiedEmail.into());
        }

        info!(user_id = %user.id, "User logged in successfully");
        Ok(user)
    }
}
