//! # sudu-service
//!
//! Application layer: the verification, recovery and Telegram link protocols,
//! login, the expiry sweep and the request/response DTOs the boundary uses.

pub mod dto;
pub mod services;

pub use services::{
    AuthService, AuthSettings, ExpirySweeper, LinkOutcome, RecoveryChannel, RecoveryService,
    ResetProof, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, SweepReport,
    TelegramLinkService, VerificationService,
};
