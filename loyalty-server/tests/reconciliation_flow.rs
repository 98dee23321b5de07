//! 对账流程集成测试
//!
//! 使用临时数据库 + 进程内 mock 核算服务，验证订单从提交到入账的完整
//! 闭环：状态收敛、恰好一次加分、限流退避。

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use loyalty_server::accrual::AccrualClient;
use loyalty_server::db::DbService;
use loyalty_server::db::repository::{balance, order, user};
use loyalty_server::services::{OrderService, Reconciler, SubmitOutcome};
use loyalty_server::utils::AppError;
use shared::models::OrderStatus;

const ORDER_A: &str = "4532015112830366";
const ORDER_B: &str = "79927398713";

/// 每个订单号的脚本化响应
#[derive(Clone)]
enum Mock {
    NoContent,
    RateLimited(Option<u64>),
    Resolved(&'static str, Option<f64>),
    Broken,
}

type Scripts = Arc<Mutex<HashMap<String, Mock>>>;

async fn mock_order_status(
    State(scripts): State<Scripts>,
    Path(number): Path<String>,
) -> Response {
    let script = scripts.lock().unwrap().get(&number).cloned();
    match script {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(Mock::NoContent) => StatusCode::NO_CONTENT.into_response(),
        Some(Mock::RateLimited(secs)) => {
            let mut resp = StatusCode::TOO_MANY_REQUESTS.into_response();
            if let Some(s) = secs {
                resp.headers_mut()
                    .insert("Retry-After", HeaderValue::from(s));
            }
            resp
        }
        Some(Mock::Resolved(status, accrual)) => Json(serde_json::json!({
            "order": number,
            "status": status,
            "accrual": accrual,
        }))
        .into_response(),
        Some(Mock::Broken) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// 启动 mock 核算服务，返回 (base_url, 脚本表)
async fn spawn_mock_accrual() -> (String, Scripts) {
    let scripts: Scripts = Arc::new(Mutex::new(HashMap::new()));
    let app = Router::new()
        .route("/api/orders/{number}", get(mock_order_status))
        .with_state(scripts.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock accrual");
    let addr = listener.local_addr().expect("mock accrual addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock accrual serve");
    });

    (format!("http://{addr}"), scripts)
}

struct TestEnv {
    pool: sqlx::SqlitePool,
    orders: OrderService,
    reconciler: Reconciler,
    scripts: Scripts,
    _dir: tempfile::TempDir,
}

async fn test_env() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.db");
    let db = DbService::new(&db_path.to_string_lossy())
        .await
        .expect("init database");

    let (base_url, scripts) = spawn_mock_accrual().await;
    let accrual = Arc::new(
        AccrualClient::new(base_url, Duration::from_secs(2)).expect("accrual client"),
    );

    let orders = OrderService::new(db.pool.clone(), accrual.clone());
    let reconciler = Reconciler::new(
        db.pool.clone(),
        accrual,
        Duration::from_secs(5),
        CancellationToken::new(),
    );

    TestEnv {
        pool: db.pool.clone(),
        orders,
        reconciler,
        scripts,
        _dir: dir,
    }
}

fn script(env: &TestEnv, number: &str, mock: Mock) {
    env.scripts
        .lock()
        .unwrap()
        .insert(number.to_string(), mock);
}

#[tokio::test]
async fn deferred_order_is_reconciled_and_credited_once() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    // Upstream has no verdict at submission time.
    script(&env, ORDER_A, Mock::NoContent);
    let outcome = env.orders.submit(alice.id, ORDER_A).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);

    let stored = order::find_by_number(&env.pool, ORDER_A)
        .await
        .unwrap()
        .expect("order exists");
    assert_eq!(stored.status, OrderStatus::New);
    assert_eq!(balance::get(&env.pool, alice.id).await.unwrap(), (0.0, 0.0));

    // Verdict arrives: PROCESSED with 100 points.
    script(&env, ORDER_A, Mock::Resolved("PROCESSED", Some(100.0)));
    env.reconciler.run_once().await;

    let settled = order::find_by_number(&env.pool, ORDER_A)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, OrderStatus::Processed);
    assert_eq!(settled.accrual, Some(100.0));
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (100.0, 0.0)
    );

    // Further cycles observe a final order and must not credit again.
    env.reconciler.run_once().await;
    env.reconciler.run_once().await;
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (100.0, 0.0)
    );
}

#[tokio::test]
async fn immediately_processed_order_credits_in_submission() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    script(&env, ORDER_A, Mock::Resolved("PROCESSED", Some(100.0)));
    let outcome = env.orders.submit(alice.id, ORDER_A).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);

    let stored = order::find_by_number(&env.pool, ORDER_A)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Processed);
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (100.0, 0.0)
    );

    // The order is final, so the reconciler never re-queries it.
    env.reconciler.run_once().await;
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (100.0, 0.0)
    );
}

#[tokio::test]
async fn invalid_order_settles_without_credit() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    script(&env, ORDER_B, Mock::NoContent);
    env.orders.submit(alice.id, ORDER_B).await.unwrap();

    script(&env, ORDER_B, Mock::Resolved("INVALID", None));
    env.reconciler.run_once().await;

    let stored = order::find_by_number(&env.pool, ORDER_B)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Invalid);
    assert_eq!(stored.accrual, None);
    assert_eq!(balance::get(&env.pool, alice.id).await.unwrap(), (0.0, 0.0));
}

#[tokio::test]
async fn intermediate_statuses_keep_order_unresolved() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    script(&env, ORDER_A, Mock::NoContent);
    env.orders.submit(alice.id, ORDER_A).await.unwrap();

    script(&env, ORDER_A, Mock::Resolved("PROCESSING", None));
    env.reconciler.run_once().await;
    let stored = order::find_by_number(&env.pool, ORDER_A)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Processing);

    // Still unresolved: the next verdict can move it to PROCESSED.
    script(&env, ORDER_A, Mock::Resolved("PROCESSED", Some(7.5)));
    env.reconciler.run_once().await;
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (7.5, 0.0)
    );
}

#[tokio::test]
async fn rate_limited_upstream_aborts_cycle_with_backoff() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    script(&env, ORDER_A, Mock::NoContent);
    script(&env, ORDER_B, Mock::NoContent);
    env.orders.submit(alice.id, ORDER_A).await.unwrap();
    env.orders.submit(alice.id, ORDER_B).await.unwrap();

    script(&env, ORDER_A, Mock::RateLimited(Some(30)));
    script(&env, ORDER_B, Mock::RateLimited(Some(30)));
    let backoff = env.reconciler.run_once().await;
    assert_eq!(backoff, Some(Duration::from_secs(30)));

    // Nothing moved; both orders are retried once the upstream recovers.
    script(&env, ORDER_A, Mock::Resolved("PROCESSED", Some(10.0)));
    script(&env, ORDER_B, Mock::Resolved("PROCESSED", Some(20.0)));
    let backoff = env.reconciler.run_once().await;
    assert_eq!(backoff, None);
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (30.0, 0.0)
    );
}

#[tokio::test]
async fn unavailable_upstream_skips_only_the_failing_order() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    script(&env, ORDER_A, Mock::NoContent);
    script(&env, ORDER_B, Mock::NoContent);
    env.orders.submit(alice.id, ORDER_A).await.unwrap();
    env.orders.submit(alice.id, ORDER_B).await.unwrap();

    script(&env, ORDER_A, Mock::Broken);
    script(&env, ORDER_B, Mock::Resolved("PROCESSED", Some(20.0)));
    env.reconciler.run_once().await;

    // The broken order stays pending, the healthy one settled.
    let a = order::find_by_number(&env.pool, ORDER_A).await.unwrap().unwrap();
    let b = order::find_by_number(&env.pool, ORDER_B).await.unwrap().unwrap();
    assert_eq!(a.status, OrderStatus::New);
    assert_eq!(b.status, OrderStatus::Processed);
    assert_eq!(
        balance::get(&env.pool, alice.id).await.unwrap(),
        (20.0, 0.0)
    );
}

#[tokio::test]
async fn resubmission_is_idempotent_and_conflicts_across_users() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();
    let bob = user::create(&env.pool, "bob", "hash").await.unwrap();

    script(&env, ORDER_A, Mock::NoContent);
    assert_eq!(
        env.orders.submit(alice.id, ORDER_A).await.unwrap(),
        SubmitOutcome::Accepted
    );
    assert_eq!(
        env.orders.submit(alice.id, ORDER_A).await.unwrap(),
        SubmitOutcome::AlreadyUploaded
    );

    let err = env.orders.submit(bob.id, ORDER_A).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE number = ?")
        .bind(ORDER_A)
        .fetch_one(&env.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn malformed_numbers_are_rejected_before_any_lookup() {
    let env = test_env().await;
    let alice = user::create(&env.pool, "alice", "hash").await.unwrap();

    let err = env.orders.submit(alice.id, "  ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = env.orders.submit(alice.id, "4532015112830367").await.unwrap_err();
    assert!(matches!(err, AppError::Unprocessable(_)));

    let err = env.orders.submit(alice.id, "45a").await.unwrap_err();
    assert!(matches!(err, AppError::Unprocessable(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&env.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
