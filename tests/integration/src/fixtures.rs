//! Test fixtures and request bodies

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

pub const PASSWORD: &str = "Parol-2025";
pub const NEW_PASSWORD: &str = "Novyi-Parol-2025";

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Fresh address for a test account
pub fn unique_email() -> String {
    format!("user{}@sudu.test", unique_suffix())
}

pub fn register_body(email: &str) -> Value {
    json!({
        "full_name": "Иван Петров",
        "email": email,
        "password": PASSWORD,
    })
}

pub fn login_body(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

pub fn email_body(email: &str) -> Value {
    json!({ "email": email })
}

pub fn confirm_link_body(code: &str, chat_id: i64) -> Value {
    json!({ "linkCode": code, "telegram_chat_id": chat_id })
}
