//! Route definitions
//!
//! Everything is mounted under `/api`.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, health, recovery, telegram};
use crate::state::AppState;

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(recovery_routes())
        .merge(telegram_routes())
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Registration, verification and login
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email", get(auth::verify_email))
        .route("/auth/login", post(auth::login))
}

/// Password recovery by email link or Telegram code
fn recovery_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/forgot-password", post(recovery::forgot_password))
        .route("/auth/request-password-reset", post(recovery::request_password_reset))
        .route("/auth/reset-password", post(recovery::reset_password))
}

/// Telegram account linking
fn telegram_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/request-telegram-link", post(telegram::request_link))
        .route("/auth/confirm-telegram-link", post(telegram::confirm_link))
        .route("/auth/check-telegram-link", post(telegram::check_link))
}
