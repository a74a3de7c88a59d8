//! Telegram account link handlers

use axum::{extract::State, Json};

use sudu_service::dto::{
    CheckLinkResponse, ConfirmLinkRequest, ConfirmLinkResponse, EmailRequest, LinkCodeResponse,
};
use sudu_service::TelegramLinkService;

use crate::extractors::ValidatedJson;
use crate::response::ApiResult;
use crate::state::AppState;

/// Issue a link code for an existing account
///
/// POST /api/auth/request-telegram-link
pub async fn request_link(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<LinkCodeResponse>> {
    let issued = TelegramLinkService::new(state.service_context())
        .request_link(&request.email)
        .await?;
    Ok(Json(LinkCodeResponse::new(issued.code, issued.expires_in)))
}

/// Bind a chat with a link code. Used by bots running out of process;
/// the built-in bot calls the service directly.
///
/// POST /api/auth/confirm-telegram-link
pub async fn confirm_link(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ConfirmLinkRequest>,
) -> ApiResult<Json<ConfirmLinkResponse>> {
    let outcome = TelegramLinkService::new(state.service_context())
        .confirm_link(&request.link_code, request.telegram_chat_id)
        .await?;
    Ok(Json(ConfirmLinkResponse::from(&outcome)))
}

/// POST /api/auth/check-telegram-link
pub async fn check_link(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<CheckLinkResponse>> {
    let linked = TelegramLinkService::new(state.service_context())
        .check_link(&request.email)
        .await?;
    Ok(Json(CheckLinkResponse::new(linked)))
}
