//! Auth API 模块

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/user", routes())
}

fn routes() -> Router<ServerState> {
    // 公共路由：认证中间件按路径放行
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
}
