//! # sudu-core
//!
//! Domain layer for the СУДУ authentication backend: entities, value objects,
//! the error taxonomy, and the ports (repository traits, notification channel,
//! clock, token issuer) that the protocol layer is written against.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod tokens;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChatBinding, CodePurpose, NewOneTimeCode, NewPendingRegistration, NewUser, OneTimeCode,
    PendingRegistration, User,
};
pub use error::{DomainError, NotificationError};
pub use tokens::{RandomTokenIssuer, TokenIssuer};
pub use traits::{
    Clock, EmailTokenRepository, ManualClock, MessageId, NotificationChannel,
    OneTimeCodeRepository, PendingRegistrationRepository, RepoResult, SystemClock,
    UserRepository,
};
pub use value_objects::{ChatId, IdParseError, UserId};
