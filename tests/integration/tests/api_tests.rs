//! API Integration Tests
//!
//! Every test spawns the full router on a local port over the in-memory
//! store, so no external services are needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use futures::future::join_all;
use integration_tests::{assert_error, assert_json, fixtures::*, TestServer};
use reqwest::{header, StatusCode};
use serde_json::json;

/// Register in email mode and follow the verification link
async fn register_verified(server: &TestServer, email: &str) {
    let response = server
        .post("/api/auth/register", &register_body(email))
        .await
        .unwrap();
    assert_json(response, StatusCode::OK).await.unwrap();

    let token = server.last_email_token(email).expect("verification email");
    let response = server
        .get(&format!("/api/auth/verify-email?token={token}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

/// Request a link code for `email` and confirm it from `chat_id`
async fn link_account(server: &TestServer, email: &str, chat_id: i64) {
    let response = server
        .post("/api/auth/request-telegram-link", &email_body(email))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    let code = body["linkCode"].as_str().unwrap();

    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(code, chat_id),
        )
        .await
        .unwrap();
    assert_json(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/health").await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Сервер работает!");
    assert!(body["timestamp"].as_str().unwrap().starts_with("2025-03-01T09:00:00"));
}

// ============================================================================
// Registration and email verification
// ============================================================================

#[tokio::test]
async fn test_register_sends_verification_link() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();

    let response = server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["success"], true);
    assert!(body["user_id"].is_i64());
    assert_eq!(server.store.user_count(), 1);

    let emails = server.notifier.emails_to(&email);
    assert_eq!(emails.len(), 1);
    assert!(emails[0].contains("https://sudu.test/verify-email.html?token="));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();

    server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    let response = server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();

    let body = assert_error(response, StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL")
        .await
        .unwrap();
    assert_eq!(body["error"], "Пользователь с таким email уже существует");
    assert_eq!(server.store.user_count(), 1);
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post(
            "/api/auth/register",
            &json!({ "email": unique_email(), "password": PASSWORD }),
        )
        .await
        .unwrap();

    let body = assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        .await
        .unwrap();
    assert_eq!(body["error"], "Все поля обязательны для заполнения");
    assert_eq!(server.store.user_count(), 0);
}

#[tokio::test]
async fn test_register_survives_email_failure() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.notifier.fail_email(true);

    let response = server
        .post("/api/auth/register", &register_body(&unique_email()))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(server.store.user_count(), 1);
}

#[tokio::test]
async fn test_verify_email_redirects_once() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    let token = server.last_email_token(&email).unwrap();
    let path = format!("/api/auth/verify-email?token={token}");

    let first = server.get(&path).await.unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        first.headers()[header::LOCATION],
        "/verification-success.html"
    );

    let second = server.get(&path).await.unwrap();
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        second.headers()[header::LOCATION],
        "/verification-failed.html"
    );
}

#[tokio::test]
async fn test_verify_email_without_token() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/auth/verify-email").await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/verification-failed.html"
    );
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_requires_verified_email() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();

    let response = server
        .post("/api/auth/login", &login_body(&email, PASSWORD))
        .await
        .unwrap();
    assert_error(response, StatusCode::UNAUTHORIZED, "UNVERIFIED_EMAIL")
        .await
        .unwrap();

    // A wrong password never reveals the verification state
    let response = server
        .post("/api/auth/login", &login_body(&email, "wrong"))
        .await
        .unwrap();
    assert_error(response, StatusCode::UNAUTHORIZED, "WRONG_CREDENTIALS")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_after_verification() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;

    let response = server
        .post("/api/auth/login", &login_body(&email, PASSWORD))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["name"], "Иван Петров");
    assert_eq!(body["user"]["email_verified"], true);
    assert_eq!(body["user"]["telegram_linked"], false);
}

#[tokio::test]
async fn test_login_unknown_email() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/api/auth/login", &login_body("nobody@sudu.test", PASSWORD))
        .await
        .unwrap();

    let body = assert_error(response, StatusCode::UNAUTHORIZED, "WRONG_CREDENTIALS")
        .await
        .unwrap();
    assert_eq!(body["error"], "Неверный email или пароль");
}

// ============================================================================
// Password reset by email
// ============================================================================

#[tokio::test]
async fn test_forgot_password_is_silent_for_unknown_email() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/api/auth/forgot-password", &email_body("ghost@sudu.test"))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Если email существует, инструкции отправлены");
    assert!(server.notifier.emails_to("ghost@sudu.test").is_empty());
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;

    server
        .post("/api/auth/forgot-password", &email_body(&email))
        .await
        .unwrap();
    let reset_email = server.notifier.emails_to(&email).pop().unwrap();
    assert!(reset_email.contains("https://sudu.test/reset-password.html?token="));
    let token = server.last_email_token(&email).unwrap();

    let reset = json!({ "token": token, "newPassword": NEW_PASSWORD });
    let response = server.post("/api/auth/reset-password", &reset).await.unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["message"], "Пароль успешно изменен");

    let response = server.post("/api/auth/reset-password", &reset).await.unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_TOKEN")
        .await
        .unwrap();

    let (status, _) = server
        .post_json("/api/auth/login", &login_body(&email, PASSWORD))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server
        .post_json("/api/auth/login", &login_body(&email, NEW_PASSWORD))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_token_expires_after_an_hour() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;

    server
        .post("/api/auth/forgot-password", &email_body(&email))
        .await
        .unwrap();
    let token = server.last_email_token(&email).unwrap();
    server.advance(61);

    let response = server
        .post(
            "/api/auth/reset-password",
            &json!({ "token": token, "newPassword": NEW_PASSWORD }),
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_TOKEN")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_password_needs_a_proof() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post(
            "/api/auth/reset-password",
            &json!({ "email": unique_email(), "newPassword": NEW_PASSWORD }),
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        .await
        .unwrap();
}

// ============================================================================
// Telegram linking
// ============================================================================

#[tokio::test]
async fn test_link_code_round_trip() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;

    let response = server
        .post("/api/auth/request-telegram-link", &email_body(&email))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    let code = body["linkCode"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(body["expiresIn"], 600);
    assert!(body["instructions"].as_str().unwrap().contains(&code));

    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(&code, 555),
        )
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["already_linked"], false);
    assert_eq!(server.notifier.telegram_to(555_i64.into()).len(), 1);

    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(&code, 555),
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_CODE")
        .await
        .unwrap();

    let (_, body) = server
        .post_json("/api/auth/check-telegram-link", &email_body(&email))
        .await
        .unwrap();
    assert_eq!(body["linked"], true);
}

#[tokio::test]
async fn test_request_link_rejections() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/api/auth/request-telegram-link", &email_body("ghost@sudu.test"))
        .await
        .unwrap();
    assert_error(response, StatusCode::NOT_FOUND, "USER_NOT_FOUND")
        .await
        .unwrap();

    let email = unique_email();
    register_verified(&server, &email).await;
    link_account(&server, &email, 555).await;

    let response = server
        .post("/api/auth/request-telegram-link", &email_body(&email))
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "ALREADY_LINKED")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_chat_bound_to_other_account() {
    let server = TestServer::start().await.expect("Failed to start server");
    let first = unique_email();
    let second = unique_email();
    register_verified(&server, &first).await;
    register_verified(&server, &second).await;
    link_account(&server, &first, 555).await;

    let (_, body) = server
        .post_json("/api/auth/request-telegram-link", &email_body(&second))
        .await
        .unwrap();
    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(body["linkCode"].as_str().unwrap(), 555),
        )
        .await
        .unwrap();

    assert_error(response, StatusCode::BAD_REQUEST, "ALREADY_BOUND_TO_OTHER")
        .await
        .unwrap();
    let (_, body) = server
        .post_json("/api/auth/check-telegram-link", &email_body(&second))
        .await
        .unwrap();
    assert_eq!(body["linked"], false);
}

#[tokio::test]
async fn test_relink_same_chat_is_idempotent() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;

    let (_, first) = server
        .post_json("/api/auth/request-telegram-link", &email_body(&email))
        .await
        .unwrap();
    let (_, second) = server
        .post_json("/api/auth/request-telegram-link", &email_body(&email))
        .await
        .unwrap();

    let (status, _) = server
        .post_json(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(first["linkCode"].as_str().unwrap(), 555),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post_json(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(second["linkCode"].as_str().unwrap(), 555),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_linked"], true);
}

#[tokio::test]
async fn test_concurrent_confirmations_have_one_winner() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;
    let (_, body) = server
        .post_json("/api/auth/request-telegram-link", &email_body(&email))
        .await
        .unwrap();
    let code = body["linkCode"].as_str().unwrap().to_string();

    let attempts = (0..8).map(|i| {
        let body = confirm_link_body(&code, 1000 + i);
        let server = &server;
        async move {
            server
                .post("/api/auth/confirm-telegram-link", &body)
                .await
                .unwrap()
                .status()
        }
    });
    let statuses = join_all(attempts).await;

    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(winners, 1);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::OK || *s == StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_expired_link_code() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;
    let (_, body) = server
        .post_json("/api/auth/request-telegram-link", &email_body(&email))
        .await
        .unwrap();
    server.advance(11);

    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(body["linkCode"].as_str().unwrap(), 555),
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_CODE")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_check_link_unknown_email() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (status, body) = server
        .post_json("/api/auth/check-telegram-link", &email_body("ghost@sudu.test"))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "linked": false }));
}

// ============================================================================
// Password reset by Telegram code
// ============================================================================

#[tokio::test]
async fn test_recovery_code_round_trip() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;
    link_account(&server, &email, 555).await;

    let response = server
        .post("/api/auth/request-password-reset", &email_body(&email))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["message"], "Код восстановления отправлен в Telegram");

    let code = server.last_telegram_code(555).expect("recovery code");
    let response = server
        .post(
            "/api/auth/reset-password",
            &json!({ "email": email, "code": code, "newPassword": NEW_PASSWORD }),
        )
        .await
        .unwrap();
    assert_json(response, StatusCode::OK).await.unwrap();

    let (status, _) = server
        .post_json("/api/auth/login", &login_body(&email, NEW_PASSWORD))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_recovery_code_expires() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;
    link_account(&server, &email, 555).await;
    server
        .post("/api/auth/request-password-reset", &email_body(&email))
        .await
        .unwrap();
    let code = server.last_telegram_code(555).unwrap();
    server.advance(11);

    let response = server
        .post(
            "/api/auth/reset-password",
            &json!({ "email": email, "code": code, "newPassword": NEW_PASSWORD }),
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_CODE")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_recovery_requires_linked_account() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/api/auth/request-password-reset", &email_body("ghost@sudu.test"))
        .await
        .unwrap();
    assert_error(response, StatusCode::NOT_FOUND, "USER_NOT_FOUND")
        .await
        .unwrap();

    let email = unique_email();
    register_verified(&server, &email).await;
    let response = server
        .post("/api/auth/request-password-reset", &email_body(&email))
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "NOT_LINKED")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_recovery_send_failure_is_bad_gateway() {
    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    register_verified(&server, &email).await;
    link_account(&server, &email, 555).await;
    server.notifier.fail_telegram(true);

    let response = server
        .post("/api/auth/request-password-reset", &email_body(&email))
        .await
        .unwrap();
    let body = assert_error(response, StatusCode::BAD_GATEWAY, "TRANSPORT_FAILURE")
        .await
        .unwrap();
    assert!(!body["error"].as_str().unwrap().contains("blocked"));
}

// ============================================================================
// Telegram registration mode
// ============================================================================

#[tokio::test]
async fn test_pending_registration_completes_in_telegram() {
    let server = TestServer::start_telegram_mode()
        .await
        .expect("Failed to start server");
    let email = unique_email();

    let response = server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    let code = body["linkCode"].as_str().unwrap().to_string();
    assert_eq!(body["expiresIn"], 900);
    assert_eq!(server.store.user_count(), 0);

    let (status, _) = server
        .post_json("/api/auth/login", &login_body(&email, PASSWORD))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(&code, 777),
        )
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["already_linked"], false);
    assert_eq!(server.store.user_count(), 1);
    assert_eq!(server.notifier.telegram_to(777_i64.into()).len(), 1);

    let (status, body) = server
        .post_json("/api/auth/login", &login_body(&email, PASSWORD))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["telegram_linked"], true);
}

#[tokio::test]
async fn test_pending_registration_expires() {
    let server = TestServer::start_telegram_mode()
        .await
        .expect("Failed to start server");
    let email = unique_email();

    let (_, body) = server
        .post_json("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    server.advance(16);

    let response = server
        .post(
            "/api/auth/confirm-telegram-link",
            &confirm_link_body(body["linkCode"].as_str().unwrap(), 777),
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_CODE")
        .await
        .unwrap();
    assert_eq!(server.store.user_count(), 0);

    // The address is free again once the pending row is stale
    let (status, _) = server
        .post_json("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_pending_registration_blocks_duplicate() {
    let server = TestServer::start_telegram_mode()
        .await
        .expect("Failed to start server");
    let email = unique_email();

    server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();
    let response = server
        .post("/api/auth/register", &register_body(&email))
        .await
        .unwrap();

    assert_error(response, StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL")
        .await
        .unwrap();
}
