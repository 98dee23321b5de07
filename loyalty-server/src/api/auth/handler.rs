//! Authentication Handlers
//!
//! Handles registration and login; both return a bearer token in the body
//! and mirror it into the `Authorization` response header for clients that
//! only read headers.

use axum::{Json, extract::State, http::header};

use crate::auth::password;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::{AppError, AppResult};
use shared::models::{Credentials, TokenResponse};

type TokenReply = ([(header::HeaderName, String); 1], Json<TokenResponse>);

fn token_reply(token: String) -> TokenReply {
    (
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        Json(TokenResponse { token }),
    )
}

/// POST /api/user/register - 注册新用户并签发令牌
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<Credentials>,
) -> AppResult<TokenReply> {
    let login = req.login.trim();
    if login.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Login and password are required"));
    }
    if !password::is_valid_password(&req.password) {
        return Err(AppError::validation(
            "Password must be at least 8 characters long and contain letters and digits",
        ));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let created = user::create(&state.pool, login, &password_hash)
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::Duplicate(_) => {
                AppError::conflict("Login already exists")
            }
            other => other.into(),
        })?;

    let token = state
        .get_jwt_service()
        .generate_token(created.id, &created.login)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(user_id = created.id, login = %created.login, "User registered");

    Ok(token_reply(token))
}

/// POST /api/user/login - 验证凭证并签发令牌
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<Credentials>,
) -> AppResult<TokenReply> {
    let login = req.login.trim();
    if login.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Login and password are required"));
    }

    let found = user::find_by_login(&state.pool, login)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let password_valid = password::verify_password(&req.password, &found.password_hash)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !password_valid {
        return Err(AppError::invalid_credentials());
    }

    let token = state
        .get_jwt_service()
        .generate_token(found.id, &found.login)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(user_id = found.id, login = %found.login, "User logged in");

    Ok(token_reply(token))
}
