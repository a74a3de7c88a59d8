//! Registration, email verification and login handlers

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use tracing::warn;

use sudu_service::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use sudu_service::{AuthService, VerificationService};

use crate::extractors::ValidatedJson;
use crate::response::ApiResult;
use crate::state::AppState;

pub const VERIFICATION_SUCCESS_PAGE: &str = "/verification-success.html";
pub const VERIFICATION_FAILED_PAGE: &str = "/verification-failed.html";

/// Register a new account in the configured mode
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.register(request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

/// Follow the link from a verification email
///
/// GET /api/auth/verify-email?token=
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Redirect {
    let token = query.token.unwrap_or_default();
    match VerificationService::new(state.service_context())
        .confirm_verification(&token)
        .await
    {
        Ok(_) => Redirect::to(VERIFICATION_SUCCESS_PAGE),
        Err(e) => {
            warn!(error = %e, "Email verification failed");
            Redirect::to(VERIFICATION_FAILED_PAGE)
        }
    }
}

/// Login with email and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let service = AuthService::new(state.service_context());
    let user = service.login(request).await?;
    Ok(Json(LoginResponse::new(&user)))
}
