//! Protocol services
//!
//! Each service borrows the shared [`ServiceContext`] for the duration of a
//! call. Store writes with more than one row are single repository calls;
//! notifications are sent only after those calls return.

pub mod auth;
pub mod context;
pub mod error;
pub mod recovery;
pub mod sweeper;
pub mod telegram_link;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::AuthService;
pub use context::{AuthSettings, ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use recovery::{RecoveryChannel, RecoveryService, ResetProof};
pub use sweeper::{ExpirySweeper, SweepReport};
pub use telegram_link::{IssuedCode, LinkOutcome, TelegramLinkService};
pub use verification::{Registration, VerificationService};
