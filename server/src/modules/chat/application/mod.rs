// Chat Application Layer - 应用层
// 实现 CQRS 模式的命令和查询处理器，以及单轮对话的调度器

pub mod commands;
mod dispatcher;
pub mod queries;
mod session_store;
mod turns;

// 导出命令和查询
pub use commands::*;
pub use dispatcher::*;
pub use queries::*;
pub use session_store::*;
pub use turns::*;

use async_trait::async_trait;
use thiserror::Error;

use super::ports::RepositoryError;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// 命令处理器 trait
///
/// 遵循 CQRS 模式，命令处理器负责执行有副作用的操作
#[async_trait]
pub trait CommandHandler<C, R>: Send + Sync
where
    C: Send + Sync,
{
    /// 执行命令
    async fn handle(&self, command: C) -> Result<R, ApplicationError>;
}

/// 查询处理器 trait
///
/// 遵循 CQRS 模式，查询处理器负责只读操作
#[async_trait]
pub trait QueryHandler<Q, R>: Send + Sync
where
    Q: Send + Sync,
{
    /// 执行查询
    async fn handle(&self, query: Q) -> Result<R, ApplicationError>;
}
