//! Integration test utilities for the СУДУ auth server
//!
//! Spawns the real router on a local port over the in-memory store, a
//! recording notifier and a manual clock, and talks to it over HTTP.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
