//! Domain entities

mod code;
mod pending;
mod user;

pub use code::{ChatBinding, CodePurpose, NewOneTimeCode, OneTimeCode};
pub use pending::{NewPendingRegistration, PendingRegistration};
pub use user::{NewUser, User};
