//! Password recovery handlers, by email link or Telegram code

use axum::{extract::State, Json};

use sudu_service::dto::{EmailRequest, MessageResponse, ResetPasswordRequest};
use sudu_service::{RecoveryChannel, RecoveryService};

use crate::extractors::ValidatedJson;
use crate::response::ApiResult;
use crate::state::AppState;

/// Mail a reset link. The answer is the same whether or not the address
/// belongs to an account.
///
/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    RecoveryService::new(state.service_context())
        .request_reset(RecoveryChannel::Email, &request.email)
        .await?;
    Ok(Json(MessageResponse::ok(
        "Если email существует, инструкции отправлены",
    )))
}

/// Send a recovery code to the linked Telegram chat
///
/// POST /api/auth/request-password-reset
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    RecoveryService::new(state.service_context())
        .request_reset(RecoveryChannel::Telegram, &request.email)
        .await?;
    Ok(Json(MessageResponse::ok(
        "Код восстановления отправлен в Telegram",
    )))
}

/// Set a new password with a reset token or a recovery code
///
/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let proof = request.proof()?;
    RecoveryService::new(state.service_context())
        .reset_password(&proof, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::ok("Пароль успешно изменен")))
}
