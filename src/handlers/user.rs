//! 用户管理的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{parse_id, ValidatedJson},
    middleware::AppState,
    models::user::*,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 注册用户（公开）
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let users = state.user_service.list().await?;

    let user_responses: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(user_responses))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get(parse_id(&id)?).await?;

    Ok(Json(UserResponse::from(user)))
}

/// 更新用户
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_service
        .update(&auth_context, parse_id(&id)?, req)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .user_service
        .delete(&auth_context, parse_id(&id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
