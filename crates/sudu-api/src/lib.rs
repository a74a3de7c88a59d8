//! # sudu-api
//!
//! HTTP boundary built with Axum: JSON endpoints over the service layer,
//! middleware, and the server bootstrap that also runs the expiry sweeper
//! and the Telegram bot.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, run};
pub use state::AppState;
