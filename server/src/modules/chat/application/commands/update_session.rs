use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler, SessionStore};
use crate::modules::chat::domain::{Session, SessionId};
use crate::modules::chat::ports::RepositoryError;

/// 标题最大长度（字符）
pub const MAX_TITLE_CHARS: usize = 200;

/// 更新会话命令（重命名）
#[derive(Debug, Clone)]
pub struct UpdateSessionCommand {
    pub session_id: SessionId,
    pub title: String,
}

impl UpdateSessionCommand {
    pub fn new(session_id: SessionId, title: impl Into<String>) -> Self {
        Self {
            session_id,
            title: title.into(),
        }
    }
}

/// 更新会话响应
#[derive(Debug, Clone)]
pub struct UpdateSessionResponse {
    pub session: Session,
}

/// 更新会话处理器
pub struct UpdateSessionHandler {
    store: Arc<SessionStore>,
}

impl UpdateSessionHandler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler<UpdateSessionCommand, UpdateSessionResponse> for UpdateSessionHandler {
    async fn handle(
        &self,
        command: UpdateSessionCommand,
    ) -> Result<UpdateSessionResponse, ApplicationError> {
        let title = command.title.trim();
        if title.is_empty() {
            return Err(ApplicationError::ValidationError(
                "Title must not be empty".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ApplicationError::ValidationError(format!(
                "Title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let session = self
            .store
            .rename(command.session_id, title)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(id) => ApplicationError::SessionNotFound(id),
                other => other.into(),
            })?;

        Ok(UpdateSessionResponse { session })
    }
}
