//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Absent when SMTP is not configured; email is then only logged
    pub email: Option<EmailConfig>,
    pub telegram: TelegramConfig,
    pub recovery: RecoveryConfig,
    pub sweep: SweepConfig,
    pub cors: CorsConfig,
    /// Base URL that links in outgoing emails point at
    pub public_url: String,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// How new accounts are created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
    /// Create the user at once and email a verification link
    #[default]
    Email,
    /// Hold the registration until a Telegram chat confirms its link code
    Telegram,
}

impl FromStr for RegistrationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "telegram" => Ok(Self::Telegram),
            _ => Err(()),
        }
    }
}

/// Longest accepted token or code lifetime: 30 days
pub const MAX_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Token and code lifetimes, registration behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub registration_mode: RegistrationMode,
    /// Reject login for accounts whose email is not verified
    pub require_verified_email: bool,
    #[serde(default = "default_reset_token_ttl_secs")]
    pub reset_token_ttl_secs: i64,
    #[serde(default = "default_code_ttl_secs")]
    pub link_code_ttl_secs: i64,
    #[serde(default = "default_code_ttl_secs")]
    pub recovery_code_ttl_secs: i64,
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_registration_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            registration_mode: RegistrationMode::Email,
            require_verified_email: true,
            reset_token_ttl_secs: default_reset_token_ttl_secs(),
            link_code_ttl_secs: default_code_ttl_secs(),
            recovery_code_ttl_secs: default_code_ttl_secs(),
            pending_registration_ttl_secs: default_pending_ttl_secs(),
        }
    }
}

/// SMTP settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

/// Telegram Bot API settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Run the long-polling command loop when a token is present
    #[serde(default = "default_true")]
    pub polling: bool,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_telegram_api_base(),
            polling: true,
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// Password recovery behaviour
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecoveryConfig {
    /// Answer Telegram reset requests for unknown or unlinked accounts with
    /// the same generic success as real ones
    #[serde(default)]
    pub conceal_telegram_account_state: bool,
}

/// Expiry sweep settings
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "sudu-auth".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_reset_token_ttl_secs() -> i64 {
    3600 // 1 hour
}

fn default_code_ttl_secs() -> i64 {
    600 // 10 minutes
}

fn default_pending_ttl_secs() -> i64 {
    900 // 15 minutes
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "СУДУ".to_string()
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_public_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Parse an optional variable, failing on a present-but-invalid value
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
    }
}

/// Lifetime in seconds, within `1..=MAX_TTL_SECS`
fn parse_ttl(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<i64>, ConfigError> {
    match parse_var::<i64>(lookup, name)? {
        Some(secs) if !(1..=MAX_TTL_SECS).contains(&secs) => {
            Err(ConfigError::InvalidValue(name, secs.to_string()))
        }
        ttl => Ok(ttl),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue(name, raw)),
        },
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "API_PORT")?.unwrap_or_else(default_port);

        let registration_mode = match non_empty(&lookup, "REGISTRATION_MODE") {
            None => RegistrationMode::default(),
            Some(raw) => raw
                .parse()
                .map_err(|()| ConfigError::InvalidValue("REGISTRATION_MODE", raw))?,
        };

        let email = match non_empty(&lookup, "SMTP_HOST") {
            None => None,
            Some(smtp_host) => {
                let username = non_empty(&lookup, "SMTP_USERNAME");
                let from_address = non_empty(&lookup, "SMTP_FROM")
                    .or_else(|| username.clone())
                    .ok_or(ConfigError::MissingVar("SMTP_FROM"))?;
                Some(EmailConfig {
                    smtp_host,
                    smtp_port: parse_var(&lookup, "SMTP_PORT")?.unwrap_or_else(default_smtp_port),
                    username,
                    password: non_empty(&lookup, "SMTP_PASSWORD"),
                    from_address,
                    from_name: non_empty(&lookup, "SMTP_FROM_NAME")
                        .unwrap_or_else(default_from_name),
                })
            }
        };

        Ok(Self {
            app: AppSettings {
                name: non_empty(&lookup, "APP_NAME").unwrap_or_else(default_app_name),
                env: non_empty(&lookup, "APP_ENV")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: non_empty(&lookup, "API_HOST").unwrap_or_else(default_host),
                port,
                request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS")?
                    .unwrap_or_else(default_request_timeout_secs),
            },
            database: DatabaseConfig {
                url: non_empty(&lookup, "DATABASE_URL")
                    .ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
            },
            auth: AuthConfig {
                registration_mode,
                // Telegram-registered accounts never get a verification email
                require_verified_email: parse_bool(&lookup, "REQUIRE_VERIFIED_EMAIL")?
                    .unwrap_or(registration_mode == RegistrationMode::Email),
                reset_token_ttl_secs: parse_ttl(&lookup, "RESET_TOKEN_TTL_SECS")?
                    .unwrap_or_else(default_reset_token_ttl_secs),
                link_code_ttl_secs: parse_ttl(&lookup, "LINK_CODE_TTL_SECS")?
                    .unwrap_or_else(default_code_ttl_secs),
                recovery_code_ttl_secs: parse_ttl(&lookup, "RECOVERY_CODE_TTL_SECS")?
                    .unwrap_or_else(default_code_ttl_secs),
                pending_registration_ttl_secs: parse_ttl(&lookup, "PENDING_REGISTRATION_TTL_SECS")?
                    .unwrap_or_else(default_pending_ttl_secs),
            },
            email,
            telegram: TelegramConfig {
                bot_token: non_empty(&lookup, "TELEGRAM_BOT_TOKEN"),
                api_base: non_empty(&lookup, "TELEGRAM_API_BASE")
                    .unwrap_or_else(default_telegram_api_base),
                polling: parse_bool(&lookup, "TELEGRAM_POLLING")?.unwrap_or(true),
                poll_timeout_secs: parse_var(&lookup, "TELEGRAM_POLL_TIMEOUT_SECS")?
                    .unwrap_or_else(default_poll_timeout_secs),
            },
            recovery: RecoveryConfig {
                conceal_telegram_account_state: parse_bool(
                    &lookup,
                    "CONCEAL_TELEGRAM_ACCOUNT_STATE",
                )?
                .unwrap_or(false),
            },
            sweep: SweepConfig {
                interval_secs: parse_var(&lookup, "SWEEP_INTERVAL_SECS")?
                    .unwrap_or_else(default_sweep_interval_secs),
            },
            cors: CorsConfig {
                allowed_origins: non_empty(&lookup, "CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            public_url: non_empty(&lookup, "PUBLIC_URL")
                .or_else(|| non_empty(&lookup, "SERVER_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default_public_url(port)),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/sudu")]).unwrap();

        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.address(), "127.0.0.1:3000");
        assert_eq!(config.auth.registration_mode, RegistrationMode::Email);
        assert!(config.auth.require_verified_email);
        assert_eq!(config.auth.reset_token_ttl_secs, 3600);
        assert_eq!(config.auth.link_code_ttl_secs, 600);
        assert_eq!(config.auth.recovery_code_ttl_secs, 600);
        assert_eq!(config.auth.pending_registration_ttl_secs, 900);
        assert_eq!(config.sweep.interval_secs, 300);
        assert_eq!(config.public_url, "http://localhost:3000");
        assert!(config.email.is_none());
        assert!(config.telegram.bot_token.is_none());
        assert!(!config.recovery.conceal_telegram_account_state);
    }

    #[test]
    fn test_missing_database_url() {
        let result = config_from(&[]);
        assert!(matches!(result, Err(ConfigError::MissingVar("DATABASE_URL"))));
    }

    #[test]
    fn test_ttl_must_be_positive_and_bounded() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("RESET_TOKEN_TTL_SECS", "7200"),
            ("LINK_CODE_TTL_SECS", &MAX_TTL_SECS.to_string()),
        ])
        .unwrap();
        assert_eq!(config.auth.reset_token_ttl_secs, 7200);
        assert_eq!(config.auth.link_code_ttl_secs, MAX_TTL_SECS);

        let cases = [
            ("RESET_TOKEN_TTL_SECS", "-60".to_string()),
            ("RECOVERY_CODE_TTL_SECS", "0".to_string()),
            ("LINK_CODE_TTL_SECS", i64::MAX.to_string()),
            ("PENDING_REGISTRATION_TTL_SECS", (MAX_TTL_SECS + 1).to_string()),
            ("LINK_CODE_TTL_SECS", "9e15".to_string()),
        ];
        for (name, value) in cases {
            let result = config_from(&[("DATABASE_URL", "postgres://x"), (name, &value)]);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(n, _)) if n == name),
                "{name}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = config_from(&[("DATABASE_URL", "postgres://x"), ("API_PORT", "http")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue("API_PORT", _))));
    }

    #[test]
    fn test_telegram_mode_relaxes_login_gate() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("REGISTRATION_MODE", "telegram"),
        ])
        .unwrap();
        assert_eq!(config.auth.registration_mode, RegistrationMode::Telegram);
        assert!(!config.auth.require_verified_email);

        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("REGISTRATION_MODE", "telegram"),
            ("REQUIRE_VERIFIED_EMAIL", "true"),
        ])
        .unwrap();
        assert!(config.auth.require_verified_email);
    }

    #[test]
    fn test_smtp_section() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SMTP_HOST", "smtp.gmail.com"),
            ("SMTP_USERNAME", "sudu@gmail.com"),
            ("SMTP_PASSWORD", "app-password"),
        ])
        .unwrap();
        let email = config.email.unwrap();
        assert_eq!(email.smtp_port, 587);
        assert_eq!(email.from_address, "sudu@gmail.com");
        assert_eq!(email.from_name, "СУДУ");
    }

    #[test]
    fn test_smtp_without_sender_fails() {
        let result = config_from(&[("DATABASE_URL", "postgres://x"), ("SMTP_HOST", "smtp.local")]);
        assert!(matches!(result, Err(ConfigError::MissingVar("SMTP_FROM"))));
    }

    #[test]
    fn test_public_url_falls_back_to_server_url() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SERVER_URL", "https://sudu.example/"),
        ])
        .unwrap();
        assert_eq!(config.public_url, "https://sudu.example");
    }

    #[test]
    fn test_cors_origins_split() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("PRODUCTION".parse(), Ok(Environment::Production));
        assert!("prod".parse::<Environment>().is_err());
        assert!(Environment::Production.is_production());
        assert!(Environment::Development.is_development());
    }
}
