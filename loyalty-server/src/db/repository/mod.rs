//! Repository Module
//!
//! CRUD and transactional operations over the SQLite pool, as free
//! functions taking `&SqlitePool`. Multi-step mutations (order settlement,
//! withdrawal) run inside a single transaction; helper `_in` variants take
//! the open connection so callers can compose them atomically.

pub mod balance;
pub mod order;
pub mod user;
pub mod withdrawal;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
