//! Shared types for the loyalty backend
//!
//! Data models and request/response DTOs used by the server and by API
//! clients, plus small utilities (timestamps, ID generation).
//!
//! DB row types derive `sqlx::FromRow` behind the `db` feature so that
//! API-client consumers don't pull in the database stack.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
