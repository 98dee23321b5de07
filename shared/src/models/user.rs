//! User Model
//!
//! The user row doubles as the balance ledger: `balance` and `withdrawn`
//! live on it and exist from registration, so a missing ledger row is an
//! internal error rather than an implicit zero.

use serde::{Deserialize, Serialize};

/// User entity (row)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Spendable points; never negative in any committed state.
    pub balance: f64,
    /// Lifetime total withdrawn; monotonically non-decreasing.
    pub withdrawn: f64,
    pub created_at: i64,
}

/// Register / login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Balance as rendered to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub current: f64,
    pub withdrawn: f64,
}

/// Token payload returned by register/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
