//! Data transfer objects for API requests and responses
//!
//! Field names follow the JSON the web client already sends and reads,
//! which mixes snake_case and camelCase.

pub mod requests;
pub mod responses;

pub use requests::{
    ConfirmLinkRequest, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
pub use responses::{
    CheckLinkResponse, ConfirmLinkResponse, HealthResponse, LinkCodeResponse, LoginResponse,
    MessageResponse, PendingRegistrationResponse, RegisterResponse, RegisteredResponse,
    UserResponse,
};
