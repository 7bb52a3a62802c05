//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Option<Secret<String>>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

/// Argon2id 成本参数
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordHashConfig {
    /// 内存成本（KiB）
    pub memory_kib: u32,
    /// 迭代次数
    pub iterations: u32,
    /// 并行度
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 签名密钥（必填，使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 令牌有效期（秒）
    pub token_ttl_secs: u64,
    pub password_hash: PasswordHashConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// 列表接口返回的最大用户数
    pub list_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub users: UsersConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// `security.jwt_secret` 没有默认值，缺失时直接返回错误。
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.body_limit_bytes", 64 * 1024)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.token_ttl_secs", 7200)?
            .set_default("security.password_hash.memory_kib", 19 * 1024)?
            .set_default("security.password_hash.iterations", 2)?
            .set_default("security.password_hash.parallelism", 1)?
            .set_default("users.list_limit", 50)?;

        // 兼容未加前缀的 JWT_SECRET，带前缀的变量优先
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            settings = settings.set_default("security.jwt_secret", secret)?;
        }

        // 从环境变量加载配置（前缀为 IDENTITY_）
        settings = settings.add_source(
            Environment::with_prefix("IDENTITY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围（0 表示随机端口）
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库配置
        if self.database.backend == StorageBackend::Postgres {
            let has_url = self
                .database
                .url
                .as_ref()
                .is_some_and(|url| !url.expose_secret().trim().is_empty());
            if !has_url {
                return Err(ConfigError::Message(
                    "database.url is required when database.backend = postgres".to_string(),
                ));
            }
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 签名密钥不能为空
        if self.security.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Message("security.jwt_secret must not be empty".to_string()));
        }

        // 验证令牌过期时间
        if self.security.token_ttl_secs < 60 || self.security.token_ttl_secs > 86400 {
            return Err(ConfigError::Message(
                "token_ttl_secs must be between 60 and 86400 (1 minute to 24 hours)".to_string(),
            ));
        }

        let hash = &self.security.password_hash;
        if hash.iterations == 0 || hash.parallelism == 0 {
            return Err(ConfigError::Message(
                "password_hash iterations and parallelism must be >= 1".to_string(),
            ));
        }
        if hash.memory_kib < 8 * hash.parallelism {
            return Err(ConfigError::Message(
                "password_hash.memory_kib must be at least 8 * parallelism".to_string(),
            ));
        }

        if self.users.list_limit < 1 || self.users.list_limit > 1000 {
            return Err(ConfigError::Message(
                "users.list_limit must be between 1 and 1000".to_string(),
            ));
        }

        Ok(())
    }
}
