//! Withdrawal Model

use serde::{Deserialize, Serialize};

/// Withdrawal entity (append-only log row)
///
/// `order_number` is a user-supplied identifier for bookkeeping; it is not
/// required to reference a known order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub sum: f64,
    pub processed_at: i64,
}

/// Withdraw request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: f64,
}

/// Withdrawal as rendered in the user-facing list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: f64,
    pub processed_at: String,
}

impl From<Withdrawal> for WithdrawalView {
    fn from(w: Withdrawal) -> Self {
        Self {
            order: w.order_number,
            sum: w.sum,
            processed_at: crate::util::millis_to_rfc3339(w.processed_at),
        }
    }
}
