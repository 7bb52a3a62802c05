//! PostgreSQL 存储后端：连接池、迁移、存活检查

use crate::{config::DatabaseConfig, error::AppError};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// 按配置建立连接池；`database.url` 缺失属于配置错误
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let url = config
        .url
        .as_ref()
        .ok_or_else(|| AppError::Config("database.url is not set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(url.expose_secret())
        .await?;

    tracing::info!(max_connections = config.max_connections, "Connected to user store");
    Ok(pool)
}

/// 应用 `migrations/` 下的 users 表结构
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(sqlx::Error::from)?;

    tracing::info!("User store schema up to date");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    }
}

/// 存储存活状态，`Unhealthy` 携带仅用于日志的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}
