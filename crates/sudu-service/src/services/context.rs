//! Service context - dependency container for services
//!
//! Holds the repositories, the notification channel, the clock and token
//! issuer, and the settings the protocols read.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use sudu_common::{AppConfig, PasswordService, RegistrationMode, MAX_TTL_SECS};
use sudu_core::traits::{
    Clock, EmailTokenRepository, NotificationChannel, OneTimeCodeRepository,
    PendingRegistrationRepository, UserRepository,
};
use sudu_core::{RandomTokenIssuer, SystemClock, TokenIssuer};

use super::error::{ServiceError, ServiceResult};

/// Protocol settings derived from the application config
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Base URL used in emailed links, without a trailing slash
    pub public_url: String,
    pub registration_mode: RegistrationMode,
    pub require_verified_email: bool,
    pub reset_token_ttl: Duration,
    pub link_code_ttl: Duration,
    pub recovery_code_ttl: Duration,
    pub pending_registration_ttl: Duration,
    /// Answer Telegram recovery requests for unknown or unlinked accounts
    /// with the same success as for linked ones
    pub conceal_telegram_account_state: bool,
}

impl AuthSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            public_url: config.public_url.trim_end_matches('/').to_string(),
            registration_mode: config.auth.registration_mode,
            require_verified_email: config.auth.require_verified_email,
            reset_token_ttl: ttl(config.auth.reset_token_ttl_secs),
            link_code_ttl: ttl(config.auth.link_code_ttl_secs),
            recovery_code_ttl: ttl(config.auth.recovery_code_ttl_secs),
            pending_registration_ttl: ttl(config.auth.pending_registration_ttl_secs),
            conceal_telegram_account_state: config.recovery.conceal_telegram_account_state,
        }
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email.html?token={token}", self.public_url)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password.html?token={token}", self.public_url)
    }
}

/// Lifetimes stay within `1..=MAX_TTL_SECS` so `now + ttl` cannot overflow
fn ttl(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(1, MAX_TTL_SECS))
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:3000".to_string(),
            registration_mode: RegistrationMode::Email,
            require_verified_email: true,
            reset_token_ttl: Duration::hours(1),
            link_code_ttl: Duration::minutes(10),
            recovery_code_ttl: Duration::minutes(10),
            pending_registration_ttl: Duration::minutes(15),
            conceal_telegram_account_state: false,
        }
    }
}

/// Service context containing all dependencies
///
/// Cloning is cheap; every dependency sits behind an `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    email_token_repo: Arc<dyn EmailTokenRepository>,
    code_repo: Arc<dyn OneTimeCodeRepository>,
    pending_repo: Arc<dyn PendingRegistrationRepository>,

    // Outbound
    notifier: Arc<dyn NotificationChannel>,

    // Primitives
    clock: Arc<dyn Clock>,
    token_issuer: Arc<dyn TokenIssuer>,
    password_service: PasswordService,

    settings: AuthSettings,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    pub fn email_token_repo(&self) -> &dyn EmailTokenRepository {
        self.email_token_repo.as_ref()
    }

    pub fn code_repo(&self) -> &dyn OneTimeCodeRepository {
        self.code_repo.as_ref()
    }

    pub fn pending_repo(&self) -> &dyn PendingRegistrationRepository {
        self.pending_repo.as_ref()
    }

    // === Outbound ===

    pub fn notifier(&self) -> &dyn NotificationChannel {
        self.notifier.as_ref()
    }

    // === Primitives ===

    /// Current time according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn token_issuer(&self) -> &dyn TokenIssuer {
        self.token_issuer.as_ref()
    }

    pub fn password_service(&self) -> &PasswordService {
        &self.password_service
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("notifier", &"dyn NotificationChannel")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext
///
/// Repositories and the notifier are required. The clock defaults to the
/// system clock, tokens come from the OS RNG, settings use their defaults.
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    email_token_repo: Option<Arc<dyn EmailTokenRepository>>,
    code_repo: Option<Arc<dyn OneTimeCodeRepository>>,
    pending_repo: Option<Arc<dyn PendingRegistrationRepository>>,
    notifier: Option<Arc<dyn NotificationChannel>>,
    clock: Option<Arc<dyn Clock>>,
    token_issuer: Option<Arc<dyn TokenIssuer>>,
    settings: Option<AuthSettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn email_token_repo(mut self, repo: Arc<dyn EmailTokenRepository>) -> Self {
        self.email_token_repo = Some(repo);
        self
    }

    pub fn code_repo(mut self, repo: Arc<dyn OneTimeCodeRepository>) -> Self {
        self.code_repo = Some(repo);
        self
    }

    pub fn pending_repo(mut self, repo: Arc<dyn PendingRegistrationRepository>) -> Self {
        self.pending_repo = Some(repo);
        self
    }

    /// Use one store for every repository
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: UserRepository
            + EmailTokenRepository
            + OneTimeCodeRepository
            + PendingRegistrationRepository
            + 'static,
    {
        self.user_repo(store.clone())
            .email_token_repo(store.clone())
            .code_repo(store.clone())
            .pending_repo(store)
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationChannel>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn token_issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.token_issuer = Some(issuer);
        self
    }

    pub fn settings(mut self, settings: AuthSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Internal` if a repository or the notifier is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
            value.ok_or_else(|| ServiceError::internal(format!("{name} is required")))
        }

        Ok(ServiceContext {
            user_repo: required(self.user_repo, "user_repo")?,
            email_token_repo: required(self.email_token_repo, "email_token_repo")?,
            code_repo: required(self.code_repo, "code_repo")?,
            pending_repo: required(self.pending_repo, "pending_repo")?,
            notifier: required(self.notifier, "notifier")?,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            token_issuer: self
                .token_issuer
                .unwrap_or_else(|| Arc::new(RandomTokenIssuer)),
            password_service: PasswordService::new(),
            settings: self.settings.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_public_url() {
        let settings = AuthSettings {
            public_url: "https://sudu.example".to_string(),
            ..AuthSettings::default()
        };
        assert_eq!(
            settings.verification_link("abc"),
            "https://sudu.example/verify-email.html?token=abc"
        );
        assert_eq!(
            settings.reset_link("abc"),
            "https://sudu.example/reset-password.html?token=abc"
        );
    }

    #[test]
    fn test_builder_requires_repositories() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("user_repo is required"));
    }

    #[test]
    fn test_out_of_range_ttl_is_clamped() {
        let mut config = AppConfig::from_lookup(|name| {
            (name == "DATABASE_URL").then(|| "postgres://localhost/sudu".to_string())
        })
        .unwrap();
        config.auth.link_code_ttl_secs = i64::MAX;
        config.auth.reset_token_ttl_secs = -60;

        let settings = AuthSettings::from_config(&config);
        assert_eq!(settings.link_code_ttl, Duration::seconds(MAX_TTL_SECS));
        assert_eq!(settings.reset_token_ttl, Duration::seconds(1));
        assert!(Utc::now().checked_add_signed(settings.link_code_ttl).is_some());
    }

    #[test]
    fn test_default_lifetimes() {
        let settings = AuthSettings::default();
        assert_eq!(settings.reset_token_ttl, Duration::hours(1));
        assert_eq!(settings.link_code_ttl, Duration::minutes(10));
        assert_eq!(settings.recovery_code_ttl, Duration::minutes(10));
        assert_eq!(settings.pending_registration_ttl, Duration::minutes(15));
    }
}
