//! Order Repository
//!
//! `number` is the primary key: the INSERT's unique constraint decides
//! ownership races, and the conditional UPDATE in [`settle`] is the only
//! path that mutates an order after creation.

use super::{RepoError, RepoResult, balance};
use shared::models::{Order, OrderStatus};
use sqlx::SqlitePool;

const ORDER_SELECT: &str = "SELECT number, user_id, status, accrual, uploaded_at FROM orders";

/// Insert a new order.
///
/// When the order is born PROCESSED with a positive accrual (the upstream
/// resolved it during submission), the owner is credited in the same
/// transaction: a duplicate number credits nothing, and a failed credit
/// rolls the insert back.
pub async fn create(pool: &SqlitePool, order: &Order) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (number, user_id, status, accrual, uploaded_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&order.number)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.accrual)
    .bind(order.uploaded_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Duplicate(format!("Order {} already exists", order.number))
        }
        _ => e.into(),
    })?;

    if order.status == OrderStatus::Processed
        && let Some(points) = order.accrual
        && points > 0.0
    {
        balance::credit_in(&mut tx, order.user_id, points).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn find_by_number(pool: &SqlitePool, number: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE number = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(number)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All orders of a user, most recent first.
pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE user_id = ? ORDER BY uploaded_at DESC");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// All orders not yet in a final state, oldest first, for the reconciler.
/// The filter lives in the query (backed by a partial index), not in memory.
pub async fn list_unresolved(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{ORDER_SELECT} WHERE status NOT IN ('PROCESSED', 'INVALID') ORDER BY uploaded_at ASC"
    );
    let rows = sqlx::query_as::<_, Order>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Apply an upstream-reported transition, crediting the owner exactly once.
///
/// One transaction: the conditional UPDATE claims the order only while it
/// is not yet final (`RETURNING user_id` tells us whether the claim won),
/// and a PROCESSED claim with positive accrual credits the owner before
/// commit. Re-settling a final order is a no-op returning `false`, so
/// repeated polling (or a second reconciler instance) cannot double-credit.
pub async fn settle(
    pool: &SqlitePool,
    number: &str,
    status: OrderStatus,
    accrual: Option<f64>,
) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    let claimed: Option<i64> = sqlx::query_scalar(
        "UPDATE orders SET status = ?1, accrual = ?2 WHERE number = ?3 AND status NOT IN ('PROCESSED', 'INVALID') RETURNING user_id",
    )
    .bind(status)
    .bind(accrual)
    .bind(number)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = claimed else {
        tx.rollback().await?;
        return Ok(false);
    };

    if status == OrderStatus::Processed
        && let Some(points) = accrual
        && points > 0.0
    {
        balance::credit_in(&mut tx, user_id, points).await?;
    }

    tx.commit().await?;
    Ok(true)
}
