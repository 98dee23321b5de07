//! User Repository

use super::{RepoError, RepoResult};
use shared::models::User;
use sqlx::SqlitePool;

/// Create a user with an empty ledger (balance/withdrawn start at 0).
///
/// A taken login surfaces as `RepoError::Duplicate` via the UNIQUE
/// constraint.
pub async fn create(pool: &SqlitePool, login: &str, password_hash: &str) -> RepoResult<User> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO users (id, login, password_hash, balance, withdrawn, created_at) VALUES (?1, ?2, ?3, 0, 0, ?4)",
    )
    .bind(id)
    .bind(login)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Duplicate(format!("Login {login} already exists"))
        }
        _ => e.into(),
    })?;

    Ok(User {
        id,
        login: login.to_string(),
        password_hash: password_hash.to_string(),
        balance: 0.0,
        withdrawn: 0.0,
        created_at: now,
    })
}

pub async fn find_by_login(pool: &SqlitePool, login: &str) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, login, password_hash, balance, withdrawn, created_at FROM users WHERE login = ?",
    )
    .bind(login)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, login, password_hash, balance, withdrawn, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
