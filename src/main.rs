//! 身份服务主入口

use identity_service::{
    config::{AppConfig, StorageBackend},
    db,
    handlers::health,
    middleware::AppState,
    repository::{InMemoryUserStore, PgUserStore, UserStore},
    routes, telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("identity-service {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    // 生产环境应该直接设置环境变量，不依赖 .env 文件
    if let Ok(path) = std::env::var("IDENTITY_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置；缺少签名密钥时直接退出，不监听端口
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Identity service starting...");

    // 3. 存储后端
    let users: Arc<dyn UserStore> = match config.database.backend {
        StorageBackend::Postgres => {
            let db_pool = db::create_pool(&config.database).await?;
            db::run_migrations(&db_pool).await?;
            tracing::info!("Database initialized");
            Arc::new(PgUserStore::new(db_pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory user store; data is lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    // 4. 构建应用状态
    let app_state = Arc::new(AppState::new(config.clone(), users)?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("identity-service {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: identity-service [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  IDENTITY_SECURITY__JWT_SECRET  令牌签名密钥（必填，也可使用 JWT_SECRET）");
    println!("  IDENTITY_DATABASE__BACKEND     postgres | memory");
    println!("  IDENTITY_DATABASE__URL         PostgreSQL 连接串");
    println!("  IDENTITY_SERVER__ADDR          监听地址，默认 0.0.0.0:3000");
}
