//! Balance API Handlers

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::balance;
use crate::utils::{AppError, AppResult};
use shared::models::{BalanceView, WithdrawRequest};

/// GET /api/user/balance - 当前余额与累计提现
pub async fn balance(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<BalanceView>> {
    // 账本行随注册创建；缺失说明服务端数据不一致，不能用 0 掩盖
    let (current, withdrawn) = balance::get(&state.pool, current_user.id)
        .await
        .map_err(|e| AppError::internal(format!("Ledger lookup failed: {e}")))?;

    Ok(Json(BalanceView { current, withdrawn }))
}

/// POST /api/user/balance/withdraw - 按订单号提现积分
pub async fn withdraw(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<WithdrawRequest>,
) -> AppResult<StatusCode> {
    state.withdrawals.withdraw(current_user.id, &req).await?;
    Ok(StatusCode::OK)
}

/// GET /api/user/withdrawals - 当前用户的提现记录 (最新在前)
///
/// 空列表返回 204，与错误明确区分。
pub async fn withdrawals(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Response> {
    let rows = state.withdrawals.list(current_user.id).await?;
    if rows.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(rows).into_response())
}
