//! 用户服务：注册、查询、更新、删除

use crate::{
    auth::{AuthContext, PasswordHasher},
    error::AppError,
    models::user::*,
    repository::UserStore,
    services::auth_service::normalize_email,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    list_limit: i64,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<PasswordHasher>, list_limit: i64) -> Self {
        Self {
            users,
            hasher,
            list_limit,
        }
    }

    /// 注册新用户，密码在入库前完成哈希
    pub async fn register(&self, req: CreateUserRequest) -> Result<User, AppError> {
        req.validate()?;

        let password_hash = self.hasher.hash_blocking(req.pwd).await?;

        let user = self
            .users
            .create(NewUser {
                email: normalize_email(&req.email),
                name: req.name.trim().to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        self.users.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.users.list(self.list_limit).await
    }

    /// 更新名称或密码，只允许修改自己的账户
    pub async fn update(
        &self,
        actor: &AuthContext,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<User, AppError> {
        ensure_self(actor, id)?;
        req.validate()?;

        if req.is_empty() {
            return Err(AppError::validation("nothing to update"));
        }

        let password_hash = match req.pwd {
            Some(pwd) => Some(self.hasher.hash_blocking(pwd).await?),
            None => None,
        };

        let changes = UserChanges {
            name: req.name.map(|name| name.trim().to_string()),
            password_hash,
        };

        let user = self.users.update(id, changes).await?.ok_or(AppError::NotFound)?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// 删除账户，只允许删除自己的账户
    ///
    /// 已签发的令牌在过期前仍然有效。
    pub async fn delete(&self, actor: &AuthContext, id: Uuid) -> Result<(), AppError> {
        ensure_self(actor, id)?;

        if !self.users.delete(id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

fn ensure_self(actor: &AuthContext, id: Uuid) -> Result<(), AppError> {
    if actor.user_id != id {
        tracing::warn!(actor_id = %actor.user_id, target_id = %id, "Attempt to modify another account");
        return Err(AppError::Forbidden);
    }
    Ok(())
}
