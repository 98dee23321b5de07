//! Balance Ledger Repository
//!
//! The ledger lives on the user row. All mutations are single conditional
//! UPDATE statements, so the read-check-write sequence cannot race with
//! concurrent credits/debits on the same user: SQLite's writer lock
//! serializes the statements and each statement re-evaluates against
//! committed state.

use super::{RepoError, RepoResult};
use sqlx::{SqliteConnection, SqlitePool};

/// Read the committed (balance, withdrawn) pair.
///
/// Ledger rows exist from registration; a missing row is a server-side
/// inconsistency, not an implicit zero balance.
pub async fn get(pool: &SqlitePool, user_id: i64) -> RepoResult<(f64, f64)> {
    let row: Option<(f64, f64)> =
        sqlx::query_as("SELECT balance, withdrawn FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    row.ok_or_else(|| RepoError::NotFound(format!("Ledger row for user {user_id} not found")))
}

/// Credit points to a user's spendable balance.
pub async fn credit(pool: &SqlitePool, user_id: i64, amount: f64) -> RepoResult<()> {
    let mut conn = pool.acquire().await?;
    credit_in(&mut conn, user_id, amount).await
}

/// Credit within an open transaction (order settlement, immediate-resolution
/// submission).
pub async fn credit_in(conn: &mut SqliteConnection, user_id: i64, amount: f64) -> RepoResult<()> {
    if amount <= 0.0 {
        return Err(RepoError::Validation(format!(
            "Credit amount must be positive, got {amount}"
        )));
    }

    let rows = sqlx::query("UPDATE users SET balance = balance + ?1 WHERE id = ?2")
        .bind(amount)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Ledger row for user {user_id} not found"
        )));
    }
    Ok(())
}

/// Debit within an open transaction: moves `amount` from balance to the
/// lifetime withdrawn total, both in one statement guarded by
/// `balance >= amount`. Zero rows affected on an existing user means the
/// balance was too low; the row is left untouched.
pub async fn debit_in(conn: &mut SqliteConnection, user_id: i64, amount: f64) -> RepoResult<()> {
    if amount <= 0.0 {
        return Err(RepoError::Validation(format!(
            "Debit amount must be positive, got {amount}"
        )));
    }

    let rows = sqlx::query(
        "UPDATE users SET balance = balance - ?1, withdrawn = withdrawn + ?1 WHERE id = ?2 AND balance >= ?1",
    )
    .bind(amount)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match exists {
            Some(_) => RepoError::InsufficientBalance,
            None => RepoError::NotFound(format!("Ledger row for user {user_id} not found")),
        });
    }
    Ok(())
}
