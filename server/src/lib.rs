pub mod commands;
pub mod infrastructure;
pub mod modules;
pub mod shared;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use infrastructure::AppState;
use modules::chat::{ChatModule, ProviderRegistry};
use modules::config::{ConfigLoader, StorageBackend};
use shared::AppResult;

/// 启动 HTTP 服务，直到收到 Ctrl-C
pub async fn run() -> AppResult<()> {
    // 初始化日志，RUST_LOG 未设置时默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("Palaver starting...");

    let config = ConfigLoader::from_env().load().await?;
    let settings = config.chat.settings();

    // 初始化 LLM 提供商注册表
    let registry = Arc::new(ProviderRegistry::from_configs(config.providers.clone())?);
    tracing::info!("{} provider(s) configured", registry.count());

    // 初始化 Chat 模块
    let chat_module = match config.storage.backend {
        StorageBackend::File => {
            tracing::info!("Data directory: {:?}", config.storage.data_dir);
            ChatModule::new_with_persistence(&config.storage.data_dir, registry, settings).await?
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; sessions are lost on shutdown");
            ChatModule::new(registry, settings)
        }
    };

    let app = commands::router(AppState::new(chat_module));

    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Palaver stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
