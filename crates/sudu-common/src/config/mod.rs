//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, AuthConfig, ConfigError, CorsConfig, DatabaseConfig, EmailConfig,
    Environment, RecoveryConfig, RegistrationMode, ServerConfig, SweepConfig, TelegramConfig,
    MAX_TTL_SECS,
};
