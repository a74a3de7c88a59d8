//! PostgreSQL repository implementations

mod code;
mod email_token;
pub mod error;
mod pending;
mod user;

pub use code::PgOneTimeCodeRepository;
pub use email_token::PgEmailTokenRepository;
pub use pending::PgPendingRegistrationRepository;
pub use user::PgUserRepository;
