//! Loyalty Server - 积分奖励后端服务
//!
//! # 架构概述
//!
//! 用户注册后提交订单号，后台对账循环向外部积分核算服务查询订单状态，
//! 订单进入最终状态 PROCESSED 时恰好一次地为用户加分；用户可以凭新的
//! 订单号提取已累积的积分。
//!
//! # 模块结构
//!
//! ```text
//! loyalty-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证、密码哈希、中间件
//! ├── accrual/       # 外部核算服务客户端
//! ├── services/      # 订单提交、提现、后台对账
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (SQLite + 仓储函数)
//! └── utils/         # 错误、日志、订单号校验
//! ```

pub mod accrual;
pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use accrual::AccrualClient;
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use services::Reconciler;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 启动前的环境准备 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __                  ____
   / /   ____  __  ____/ / /___  __
  / /   / __ \/ / / / _  / __/ / / /
 / /___/ /_/ / /_/ / /_/ / /_/ /_/ /
/_____/\____/\__, /\__,_/\__/\__, /
            /____/          /____/
    "#
    );
}
