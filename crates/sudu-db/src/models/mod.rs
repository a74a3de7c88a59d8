//! Database models - SQLx-compatible structs for PostgreSQL tables

mod code;
mod pending;
mod user;

pub use code::OneTimeCodeModel;
pub use pending::PendingRegistrationModel;
pub use user::UserModel;
