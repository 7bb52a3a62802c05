//! 测试公共模块
//! 提供测试配置、应用装配和请求辅助函数

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use identity_service::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, PasswordHashConfig, SecurityConfig,
        ServerConfig, StorageBackend, UsersConfig,
    },
    middleware::AppState,
    repository::{InMemoryUserStore, UserStore},
    routes,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置（内存存储 + 低成本哈希参数）
pub fn create_test_config() -> AppConfig {
    let database_url = std::env::var("TEST_DATABASE_URL").ok().map(Secret::new);

    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            body_limit_bytes: 64 * 1024,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: database_url,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_ttl_secs: 7200,
            password_hash: PasswordHashConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        },
        users: UsersConfig { list_limit: 50 },
    }
}

/// 使用给定存储创建应用状态
pub fn create_test_app_state_with(users: Arc<dyn UserStore>) -> Arc<AppState> {
    Arc::new(AppState::new(create_test_config(), users).expect("Failed to build app state"))
}

/// 创建测试应用（内存存储）
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = create_test_app_state_with(Arc::new(InMemoryUserStore::new()));
    (routes::create_router(state.clone()), state)
}

/// 构造 JSON 请求
pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

/// 构造不带请求体的请求，`authorization` 原样写入头部
pub fn empty_request(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    builder.body(Body::empty()).unwrap()
}

/// 发送请求并解析 JSON 响应体（空响应体返回 Null）
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

/// 注册用户，返回响应体
pub async fn register(app: &Router, email: &str, name: &str, pwd: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/user",
            json!({ "email": email, "name": name, "pwd": pwd }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body
}

/// 登录，返回状态码与响应体
pub async fn login(app: &Router, email: &str, pwd: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request("POST", "/auth/login", json!({ "email": email, "pwd": pwd }), None),
    )
    .await
}

/// 注册并登录，返回 (用户 ID, 令牌)
pub async fn register_and_login(app: &Router, email: &str, name: &str, pwd: &str) -> (String, String) {
    let user = register(app, email, name, pwd).await;
    let (status, body) = login(app, email, pwd).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    (
        user["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// 断言统一的未认证响应
pub fn assert_unauthorized(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "Unauthorized");
    assert!(body["errors"].is_array());
}
