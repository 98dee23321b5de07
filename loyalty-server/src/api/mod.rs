//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录
//! - [`orders`] - 订单提交与查询
//! - [`balance`] - 余额、提现与提现记录

use axum::Router;
use axum::middleware as axum_middleware;
use http::HeaderValue;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

pub mod auth;
pub mod balance;
pub mod health;
pub mod orders;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Auth API - public register/login
        .merge(auth::router())
        // Orders API - authentication required
        .merge(orders::router())
        // Balance API - authentication required
        .merge(balance::router())
        // Health API - public route
        .merge(health::router())
}

/// Build the fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // 认证中间件 (最内层，在其余 layer 之后、处理器之前执行)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging
        .layer(TraceLayer::new_for_http())
        // Request ID
        .layer(SetRequestIdLayer::x_request_id(XRequestId))
        .with_state(state)
}
