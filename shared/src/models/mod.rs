//! Data models
//!
//! Shared between loyalty-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! IDs are `i64` (SQLite INTEGER PRIMARY KEY); timestamps are UTC
//! milliseconds, rendered as RFC 3339 in view DTOs.

pub mod order;
pub mod user;
pub mod withdrawal;

// Re-exports
pub use order::*;
pub use user::*;
pub use withdrawal::*;
