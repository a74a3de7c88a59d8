//! Error types for the domain layer

mod domain_error;
mod notification_error;

pub use domain_error::DomainError;
pub use notification_error::NotificationError;
