//! Reconciler — background worker that converges order state
//!
//! Periodically lists unresolved orders, asks the accrual service for a
//! verdict per order, and applies transitions through the transactional
//! settle path. Crediting happens inside settlement, so observing the same
//! PROCESSED verdict on later cycles is harmless.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::accrual::{AccrualClient, AccrualError, AccrualReply};
use crate::db::repository::order;
use shared::models::{Order, OrderStatus};

/// Background reconciliation worker
pub struct Reconciler {
    pool: sqlx::SqlitePool,
    accrual: Arc<AccrualClient>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl Reconciler {
    pub fn new(
        pool: sqlx::SqlitePool,
        accrual: Arc<AccrualClient>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            accrual,
            interval,
            shutdown,
        }
    }

    /// Run the reconciliation loop until cancelled.
    ///
    /// Cancellation is observed between cycles: an in-flight cycle drains
    /// its remaining orders before the loop exits. A rate-limited upstream
    /// aborts the current batch and pushes the next wake-up out to its
    /// advisory `Retry-After` hint (never below the configured interval).
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Reconciler started"
        );

        let mut wait = self.interval;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reconciler shutting down");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            wait = match self.run_once().await {
                Some(backoff) => backoff.max(self.interval),
                None => self.interval,
            };
        }

        tracing::info!("Reconciler stopped");
    }

    /// Run a single reconciliation pass.
    ///
    /// Returns a back-off duration when the upstream rate-limited us and
    /// the rest of the batch was skipped. Public so that operators and
    /// tests can drive a pass without the timer loop.
    pub async fn run_once(&self) -> Option<Duration> {
        let orders = match order::list_unresolved(&self.pool).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list unresolved orders");
                return None;
            }
        };

        if orders.is_empty() {
            return None;
        }
        tracing::debug!(count = orders.len(), "Reconciling unresolved orders");

        for unresolved in orders {
            match self.accrual.check(&unresolved.number).await {
                Ok(reply) => self.apply(&unresolved, reply).await,
                Err(AccrualError::StillProcessing) | Err(AccrualError::NotFound) => {
                    tracing::debug!(order = %unresolved.number, "No verdict yet, retrying next cycle");
                }
                Err(AccrualError::RateLimited { retry_after }) => {
                    // Do not hammer a backed-off upstream: drop the rest of
                    // the batch and resume after the hint.
                    tracing::warn!(
                        order = %unresolved.number,
                        retry_after_secs = retry_after.map(|d| d.as_secs()),
                        "Accrual service rate-limited, aborting cycle"
                    );
                    return Some(retry_after.unwrap_or(self.interval));
                }
                Err(AccrualError::Unavailable(msg)) => {
                    tracing::warn!(order = %unresolved.number, error = %msg, "Accrual check failed, skipping order");
                }
            }
        }

        None
    }

    /// Apply one upstream verdict. Failures are logged and never abort the
    /// batch; the next cycle retries.
    async fn apply(&self, unresolved: &Order, reply: AccrualReply) {
        let accrual = if reply.status == OrderStatus::Processed {
            reply.accrual
        } else {
            None
        };

        match order::settle(&self.pool, &unresolved.number, reply.status, accrual).await {
            Ok(true) => {
                tracing::info!(
                    order = %unresolved.number,
                    status = %reply.status,
                    accrual = accrual.unwrap_or(0.0),
                    "Order reconciled"
                );
            }
            Ok(false) => {
                tracing::debug!(order = %unresolved.number, "Order already final, skipping");
            }
            Err(e) => {
                tracing::error!(order = %unresolved.number, error = %e, "Failed to settle order");
            }
        }
    }
}
