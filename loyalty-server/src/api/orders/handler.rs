//! Order API Handlers

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::services::SubmitOutcome;
use crate::utils::AppResult;

/// POST /api/user/orders - 提交订单号 (text/plain 请求体)
///
/// 202 接受新订单；200 表示该用户已提交过同一订单号 (幂等)。
pub async fn submit(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    body: String,
) -> AppResult<StatusCode> {
    let outcome = state.orders.submit(current_user.id, &body).await?;
    Ok(match outcome {
        SubmitOutcome::Accepted => StatusCode::ACCEPTED,
        SubmitOutcome::AlreadyUploaded => StatusCode::OK,
    })
}

/// GET /api/user/orders - 当前用户的订单列表 (最新在前)
///
/// 空列表返回 204，与错误明确区分。
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Response> {
    let orders = state.orders.list(current_user.id).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(orders).into_response())
}
