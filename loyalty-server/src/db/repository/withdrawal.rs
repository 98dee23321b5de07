//! Withdrawal Repository
//!
//! Append-only log. The debit and the log row commit together: there is no
//! state where points left the balance without a matching record.

use super::{RepoResult, balance};
use shared::models::Withdrawal;
use sqlx::SqlitePool;

/// Debit the user and append the withdrawal record in one transaction.
///
/// An insufficient balance aborts before any mutation; a failed insert
/// rolls the debit back.
pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    order_number: &str,
    sum: f64,
) -> RepoResult<Withdrawal> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;

    balance::debit_in(&mut tx, user_id, sum).await?;

    sqlx::query(
        "INSERT INTO withdrawals (id, user_id, order_number, sum, processed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(user_id)
    .bind(order_number)
    .bind(sum)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Withdrawal {
        id,
        user_id,
        order_number: order_number.to_string(),
        sum,
        processed_at: now,
    })
}

/// All withdrawals of a user, most recent first.
pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Withdrawal>> {
    let rows = sqlx::query_as::<_, Withdrawal>(
        "SELECT id, user_id, order_number, sum, processed_at FROM withdrawals WHERE user_id = ? ORDER BY processed_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
