//! Withdrawal service
//!
//! Points leave the balance only through here. The debit and the
//! withdrawal record are one transaction (see the repository), so the
//! append-only log and the ledger cannot diverge.

use shared::models::{WithdrawRequest, Withdrawal, WithdrawalView};
use sqlx::SqlitePool;

use crate::db::repository::withdrawal;
use crate::utils::{AppError, AppResult, luhn};

/// Withdrawal processing and listing
#[derive(Clone)]
pub struct WithdrawalService {
    pool: SqlitePool,
}

impl WithdrawalService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Withdraw points against an order number.
    ///
    /// The target number is validated for shape (Luhn) but is bookkeeping
    /// only; it does not have to exist in the order store.
    pub async fn withdraw(&self, user_id: i64, req: &WithdrawRequest) -> AppResult<Withdrawal> {
        if req.sum <= 0.0 {
            return Err(AppError::validation("Withdrawal sum must be positive"));
        }
        if !luhn::validate_order_number(&req.order) {
            return Err(AppError::unprocessable("Invalid order number"));
        }

        let record = withdrawal::create(&self.pool, user_id, &req.order, req.sum).await?;

        tracing::info!(
            user_id,
            order = %record.order_number,
            sum = record.sum,
            "Withdrawal processed"
        );
        Ok(record)
    }

    /// All withdrawals of the user, most recent first.
    pub async fn list(&self, user_id: i64) -> AppResult<Vec<WithdrawalView>> {
        let rows = withdrawal::list_by_user(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(WithdrawalView::from).collect())
    }
}
