//! HTTP API 集成测试
//!
//! 通过 `api::build_app` + `tower::ServiceExt::oneshot` 驱动完整请求栈
//! (认证中间件、路由、处理器)，不经过真实网络。

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use loyalty_server::api;
use loyalty_server::core::{Config, ServerState};

const ORDER: &str = "4532015112830366";

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    // Accrual address points at a closed port: lookups fail, submission
    // still succeeds with a NEW order.
    let config = Config::with_overrides(
        dir.path().to_string_lossy().to_string(),
        0,
        "http://127.0.0.1:9",
    );
    let state = ServerState::initialize(&config).await;
    (api::build_app(state), dir)
}

async fn register(app: &Router, login: &str, password: &str) -> (StatusCode, Option<String>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"login":"{login}","password":"{password}"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let token = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["token"].as_str().map(str::to_string));
    (status, token)
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn register_login_and_token_flow() {
    let (app, _dir) = test_app().await;

    let (status, token) = register(&app, "alice", "passw0rd").await;
    assert_eq!(status, StatusCode::OK);
    let token = token.expect("register returns token");

    // Duplicate login is a conflict.
    let (status, _) = register(&app, "alice", "passw0rd").await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Weak password is rejected.
    let (status, _) = register(&app, "bob", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Login with the right password.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"login":"alice","password":"passw0rd"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::AUTHORIZATION));

    // Wrong password is a 401 with the unified message.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"login":"alice","password":"wrongpass1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The issued token passes the auth middleware.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/balance")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["current"], 0.0);
    assert_eq!(json["withdrawn"], 0.0);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (app, _dir) = test_app().await;

    for uri in [
        "/api/user/orders",
        "/api/user/balance",
        "/api/user/withdrawals",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }

    // Garbage tokens are rejected too.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/balance")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Health stays public.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_submission_over_http() {
    let (app, _dir) = test_app().await;
    let (_, token) = register(&app, "alice", "passw0rd").await;
    let token = token.unwrap();

    // Empty order list → explicit 204.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/orders")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // First submission is accepted for processing.
    let submit = |body: &'static str, token: String| {
        let app = app.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/user/orders")
                    .header(header::AUTHORIZATION, bearer(&token))
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let response = submit(ORDER, token.clone()).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Same user, same number: idempotent 200.
    let response = submit(ORDER, token.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Luhn failure: 422.
    let response = submit("4532015112830367", token.clone()).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Another user hitting the same number: 409.
    let (_, bob_token) = register(&app, "bob", "passw0rd").await;
    let response = submit(ORDER, bob_token.unwrap()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The owner sees exactly one order, status NEW (accrual unreachable).
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/orders")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let orders: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["number"], ORDER);
    assert_eq!(orders[0]["status"], "NEW");
}

#[tokio::test]
async fn withdrawal_over_http() {
    let (app, _dir) = test_app().await;
    let (_, token) = register(&app, "alice", "passw0rd").await;
    let token = token.unwrap();

    // No balance yet: 402.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/balance/withdraw")
                .header(header::AUTHORIZATION, bearer(&token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"order":"79927398713","sum":10.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    // Invalid target number: 422.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/balance/withdraw")
                .header(header::AUTHORIZATION, bearer(&token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"order":"123","sum":10.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Empty withdrawals list → explicit 204.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/withdrawals")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
