//! Route handlers
//!
//! All HTTP request handlers organized by protocol.

pub mod auth;
pub mod health;
pub mod recovery;
pub mod telegram;
