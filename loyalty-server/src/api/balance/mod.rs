//! Balance API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/user", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/balance", get(handler::balance))
        .route("/balance/withdraw", post(handler::withdraw))
        .route("/withdrawals", get(handler::withdrawals))
}
