//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 注册与登录（无需认证）
    let auth_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/user", post(handlers::user::create_user));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_current_user))
        .route("/user", get(handlers::user::list_users))
        .route(
            "/user/{id}",
            get(handlers::user::get_user)
                .patch(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.token_service.clone(),
            crate::auth::middleware::require_bearer,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
