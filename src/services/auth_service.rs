//! 认证服务：邮箱 + 密码登录，签发访问令牌

use crate::{
    auth::{jwt::ClaimSet, PasswordHasher, TokenService},
    error::AppError,
    repository::UserStore,
};
use std::sync::Arc;

/// 未知邮箱时参与比对的占位密码，保证两种失败路径耗时一致
const DUMMY_PASSWORD: &str = "dummy-password-for-timing-equalization";

pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    hasher: Arc<PasswordHasher>,
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        hasher: Arc<PasswordHasher>,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            users,
            tokens,
            hasher,
            dummy_hash,
        })
    }

    /// 用户登录
    ///
    /// - `Ok(Some(token))`：凭据正确
    /// - `Ok(None)`：邮箱不存在或密码错误，两者不加区分
    /// - `Err(_)`：存储层等基础设施错误，不是认证失败
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>, AppError> {
        let email = normalize_email(email);

        let user = self.users.find_by_email(&email).await?;

        let (stored_hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };

        let matches = self
            .hasher
            .verify_blocking(password.to_string(), stored_hash)
            .await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                tracing::info!("Login rejected: invalid credentials");
                metrics::counter!("auth_login_total", "outcome" => "rejected").increment(1);
                return Ok(None);
            }
        };

        let token = self.tokens.issue(&ClaimSet {
            subject: user.id,
            name: user.name,
        })?;

        tracing::info!(user_id = %user.id, "Login succeeded");
        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);

        Ok(Some(token))
    }
}

/// 邮箱统一为去空白、小写形式
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{PasswordHashConfig, SecurityConfig},
        models::user::NewUser,
        repository::InMemoryUserStore,
    };
    use secrecy::Secret;

    async fn setup() -> (AuthService, Arc<TokenService>, uuid::Uuid) {
        let store = Arc::new(InMemoryUserStore::new());
        let hasher = Arc::new(PasswordHasher::with_params(1024, 1, 1).unwrap());
        let tokens = Arc::new(
            TokenService::from_config(&SecurityConfig {
                jwt_secret: Secret::new("auth-service-test-secret-32-chars!!".to_string()),
                token_ttl_secs: 7200,
                password_hash: PasswordHashConfig {
                    memory_kib: 1024,
                    iterations: 1,
                    parallelism: 1,
                },
            })
            .unwrap(),
        );

        let user = store
            .create(NewUser {
                email: "a@x.com".to_string(),
                name: "Alice".to_string(),
                password_hash: hasher.hash("longenough1").unwrap(),
            })
            .await
            .unwrap();

        let service = AuthService::new(store, tokens.clone(), hasher).unwrap();
        (service, tokens, user.id)
    }

    #[tokio::test]
    async fn test_login_success_issues_token_for_user() {
        let (service, tokens, user_id) = setup().await;

        let token = service.login("a@x.com", "longenough1").await.unwrap().unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.name, "Alice");
    }

    #[tokio::test]
    async fn test_login_normalizes_email() {
        let (service, _, _) = setup().await;
        assert!(service.login(" A@X.com ", "longenough1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_rejections_are_indistinguishable() {
        let (service, _, _) = setup().await;

        let wrong_password = service.login("a@x.com", "wrong1234").await.unwrap();
        let unknown_user = service.login("nobody@x.com", "longenough1").await.unwrap();

        assert_eq!(wrong_password, None);
        assert_eq!(unknown_user, None);
    }
}
