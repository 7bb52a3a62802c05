//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::ValidatedJson,
    middleware::AppState,
    models::auth::*,
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// 登录失败时返回给客户端的唯一说明，不区分邮箱不存在与密码错误
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .auth_service
        .login(&req.email, &req.pwd)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

    Ok(Json(LoginResponse { token }))
}

/// 获取当前用户信息（来自令牌中的声明，不查询存储）
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(CurrentUserResponse {
        id: auth_context.user_id,
        name: auth_context.name,
    }))
}
