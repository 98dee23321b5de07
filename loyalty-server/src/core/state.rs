use sqlx::SqlitePool;
use std::sync::Arc;

use crate::accrual::AccrualClient;
use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::services::{OrderService, Reconciler, WithdrawalService};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc / 连接池实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | accrual | Arc<AccrualClient> | 外部核算服务客户端 |
/// | orders | OrderService | 订单提交/查询 |
/// | withdrawals | WithdrawalService | 提现处理/查询 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池 (唯一的共享可变资源)
    pub pool: SqlitePool,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 核算服务客户端
    pub accrual: Arc<AccrualClient>,
    /// 订单提交服务
    pub orders: OrderService,
    /// 提现服务
    pub withdrawals: WithdrawalService,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/loyalty.db, 自动迁移)
    /// 3. 各服务 (JWT, 核算客户端, 业务服务)
    ///
    /// # Panics
    ///
    /// 数据库或核算客户端初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Initialize DB at work_dir/database/loyalty.db
        let db_path = config.database_dir().join("loyalty.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        // 2. Initialize services
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let accrual = Arc::new(
            AccrualClient::new(config.accrual_addr.clone(), config.accrual_timeout())
                .expect("Failed to initialize accrual client"),
        );
        let orders = OrderService::new(pool.clone(), accrual.clone());
        let withdrawals = WithdrawalService::new(pool.clone());

        Self {
            config: config.clone(),
            pool,
            jwt_service,
            accrual,
            orders,
            withdrawals,
        }
    }

    /// 注册后台任务
    ///
    /// 必须在 `Server::run()` 开始服务前调用
    ///
    /// 启动的任务：
    /// - 对账循环 (Reconciler)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let reconciler = Reconciler::new(
            self.pool.clone(),
            self.accrual.clone(),
            self.config.poll_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("reconciler", TaskKind::Worker, reconciler.run());
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
