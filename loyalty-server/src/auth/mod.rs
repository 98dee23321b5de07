//! 认证模块
//!
//! - [`jwt`] - JWT 令牌生成与验证
//! - [`password`] - argon2 密码哈希与口令策略
//! - [`middleware`] - Axum 认证中间件

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
