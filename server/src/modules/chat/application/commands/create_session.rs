use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler, SessionStore};
use crate::modules::chat::domain::Session;

/// 创建会话命令
#[derive(Debug, Clone, Default)]
pub struct CreateSessionCommand {
    /// 会话标题（可选）
    pub title: Option<String>,
}

impl CreateSessionCommand {
    pub fn new(title: Option<String>) -> Self {
        Self { title }
    }
}

/// 创建会话命令响应
#[derive(Debug, Clone)]
pub struct CreateSessionResponse {
    pub session: Session,
}

/// 创建会话命令处理器
pub struct CreateSessionHandler {
    store: Arc<SessionStore>,
}

impl CreateSessionHandler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler<CreateSessionCommand, CreateSessionResponse> for CreateSessionHandler {
    async fn handle(
        &self,
        command: CreateSessionCommand,
    ) -> Result<CreateSessionResponse, ApplicationError> {
        let session = self.store.create(command.title).await?;
        Ok(CreateSessionResponse { session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::infrastructure::{
        InMemoryMessageRepository, InMemorySessionRepository,
    };

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ))
    }

    #[tokio::test]
    async fn test_create_session_with_title() {
        let store = store();
        let handler = CreateSessionHandler::new(store.clone());

        let command = CreateSessionCommand::new(Some("Test Session".to_string()));
        let response = handler.handle(command).await.unwrap();

        assert_eq!(response.session.title(), "Test Session");

        // 验证已持久化
        let saved = store.get(response.session.id()).await.unwrap();
        assert!(saved.is_some());
    }

    #[tokio::test]
    async fn test_create_session_default_title() {
        let handler = CreateSessionHandler::new(store());

        let response = handler.handle(CreateSessionCommand::default()).await.unwrap();

        assert_eq!(response.session.title(), "New Chat");
    }
}
