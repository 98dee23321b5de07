//! Order submission service
//!
//! The synchronous half of accrual: validate the number, resolve ownership,
//! take one shot at the upstream verdict, persist. Everything the upstream
//! cannot answer right now is left to the reconciler.

use shared::models::{Order, OrderStatus, OrderView};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::accrual::AccrualClient;
use crate::db::repository::{RepoError, order};
use crate::utils::{AppError, AppResult, luhn};

/// Result of a submission that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Order accepted and queued for reconciliation (HTTP 202).
    Accepted,
    /// The caller already owns this number; nothing changed (HTTP 200).
    AlreadyUploaded,
}

/// Order submission and listing
#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    accrual: Arc<AccrualClient>,
}

impl OrderService {
    pub fn new(pool: SqlitePool, accrual: Arc<AccrualClient>) -> Self {
        Self { pool, accrual }
    }

    /// Submit an order number for accrual.
    ///
    /// An accrual-service error never fails the submission: the order is
    /// stored as NEW and the reconciler picks it up on the next cycle.
    /// When the upstream resolves the order immediately to PROCESSED, the
    /// owner is credited in the same transaction as the insert.
    pub async fn submit(&self, user_id: i64, raw_number: &str) -> AppResult<SubmitOutcome> {
        let number = raw_number.trim();
        if number.is_empty() {
            return Err(AppError::validation("Order number is required"));
        }
        if !luhn::validate_order_number(number) {
            return Err(AppError::unprocessable("Invalid order number"));
        }

        // First submitter owns the number, permanently.
        if let Some(existing) = order::find_by_number(&self.pool, number).await? {
            return if existing.user_id == user_id {
                tracing::debug!(order = %number, user_id, "Order re-submitted by its owner");
                Ok(SubmitOutcome::AlreadyUploaded)
            } else {
                Err(AppError::conflict("Order already uploaded by another user"))
            };
        }

        let mut new_order = Order {
            number: number.to_string(),
            user_id,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: shared::util::now_millis(),
        };

        // One upstream lookup; any classified error defers to the reconciler.
        match self.accrual.check(number).await {
            Ok(reply) => {
                new_order.status = reply.status;
                if reply.status == OrderStatus::Processed {
                    new_order.accrual = reply.accrual;
                }
            }
            Err(e) => {
                tracing::warn!(
                    order = %number,
                    error = %e,
                    "Accrual lookup failed on submission, deferring to reconciler"
                );
            }
        }

        match order::create(&self.pool, &new_order).await {
            Ok(()) => {
                tracing::info!(
                    order = %number,
                    user_id,
                    status = %new_order.status,
                    "Order created"
                );
                Ok(SubmitOutcome::Accepted)
            }
            // Lost a concurrent first-submission race: the winner's row decides.
            Err(RepoError::Duplicate(_)) => match order::find_by_number(&self.pool, number).await? {
                Some(existing) if existing.user_id == user_id => Ok(SubmitOutcome::AlreadyUploaded),
                Some(_) => Err(AppError::conflict("Order already uploaded by another user")),
                None => Err(AppError::internal(format!(
                    "Order {number} conflicted on insert but cannot be read back"
                ))),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// All orders of the user, most recent first.
    pub async fn list(&self, user_id: i64) -> AppResult<Vec<OrderView>> {
        let orders = order::list_by_user(&self.pool, user_id).await?;
        Ok(orders.into_iter().map(OrderView::from).collect())
    }
}
