//! # sudu-db
//!
//! Credential storage: PostgreSQL repositories via SQLx, plus an in-memory
//! store with the same semantics for tests and local runs.
//!
//! Every multi-row change (claiming a code and binding a chat, promoting a
//! pending registration, consuming a token and writing a password) is a single
//! repository call. The Postgres implementations run each one inside a
//! transaction; the memory store runs each one under its lock.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sudu_db::pool::{create_pool, DatabaseConfig};
//! use sudu_db::{ensure_schema, PgUserRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     ensure_schema(&pool).await?;
//!     let user_repo = PgUserRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{create_pool, ensure_schema, DatabaseConfig, PgPool};
pub use repositories::{
    PgEmailTokenRepository, PgOneTimeCodeRepository, PgPendingRegistrationRepository,
    PgUserRepository,
};
