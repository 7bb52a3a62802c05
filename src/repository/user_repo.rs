//! User repository (数据库访问层)
//!
//! 查询结果使用 `Result<Option<User>, AppError>` 表示三种状态：
//! 找到 / 不存在 / 基础设施错误。

use crate::{
    db::{self, HealthStatus},
    error::AppError,
    models::user::*,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

/// 用户存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 创建用户，邮箱重复时返回 `AppError::Conflict`
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// 部分更新，用户不存在时返回 `None`
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;

    /// 删除用户，返回是否存在
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// 按创建时间倒序列出至多 `limit` 个用户
    async fn list(&self, limit: i64) -> Result<Vec<User>, AppError>;

    async fn health_check(&self) -> HealthStatus;
}

const DUPLICATE_EMAIL: &str = "email already registered";

/// PostgreSQL 实现
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(DUPLICATE_EMAIL.to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.password_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&self.db)
                .await?;

        Ok(users)
    }

    async fn health_check(&self) -> HealthStatus {
        db::health_check(&self.db).await
    }
}

/// 内存实现，用于本地开发与测试
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<Uuid, User>,
    // email -> id，保证邮箱唯一
    emails: DashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let id = Uuid::new_v4();

        // entry() 持有分片锁，检查与插入是原子的
        match self.emails.entry(new_user.email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let user = User {
            id,
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let Some(mut entry) = self.users.get_mut(&id) else {
            return Ok(None);
        };

        let user = entry.value_mut();
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
