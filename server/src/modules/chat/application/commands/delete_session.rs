use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler, SessionStore, TurnCoordinator};
use crate::modules::chat::domain::SessionId;

/// 删除会话命令
#[derive(Debug, Clone)]
pub struct DeleteSessionCommand {
    pub session_id: SessionId,
}

impl DeleteSessionCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// 删除会话命令响应
#[derive(Debug, Clone)]
pub struct DeleteSessionResponse {
    /// 删除的消息数量，会话不存在时为 0
    pub deleted_messages: usize,
}

/// 删除会话命令处理器
///
/// 幂等：删除不存在的会话不是错误
pub struct DeleteSessionHandler {
    store: Arc<SessionStore>,
    turns: Arc<TurnCoordinator>,
}

impl DeleteSessionHandler {
    pub fn new(store: Arc<SessionStore>, turns: Arc<TurnCoordinator>) -> Self {
        Self { store, turns }
    }
}

#[async_trait]
impl CommandHandler<DeleteSessionCommand, DeleteSessionResponse> for DeleteSessionHandler {
    async fn handle(
        &self,
        command: DeleteSessionCommand,
    ) -> Result<DeleteSessionResponse, ApplicationError> {
        // 正在生成的回复不再需要
        self.turns.cancel(command.session_id);

        let deleted_messages = self.store.delete(command.session_id).await?;
        Ok(DeleteSessionResponse { deleted_messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::Message;
    use crate::modules::chat::infrastructure::{
        InMemoryMessageRepository, InMemorySessionRepository,
    };

    fn handler() -> (DeleteSessionHandler, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ));
        let handler = DeleteSessionHandler::new(store.clone(), Arc::new(TurnCoordinator::new()));
        (handler, store)
    }

    #[tokio::test]
    async fn test_delete_session_with_messages() {
        let (handler, store) = handler();

        let session = store.create(Some("Test".to_string())).await.unwrap();
        let session_id = session.id();
        store
            .append(Message::new_user(session_id, "Hello"))
            .await
            .unwrap();
        store
            .append(Message::new_assistant(session_id, "Hi"))
            .await
            .unwrap();

        let response = handler
            .handle(DeleteSessionCommand::new(session_id))
            .await
            .unwrap();

        assert_eq!(response.deleted_messages, 2);
        assert!(store.get(session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_an_error() {
        let (handler, store) = handler();
        let session = store.create(None).await.unwrap();

        handler
            .handle(DeleteSessionCommand::new(session.id()))
            .await
            .unwrap();
        let second = handler
            .handle(DeleteSessionCommand::new(session.id()))
            .await
            .unwrap();

        assert_eq!(second.deleted_messages, 0);
    }
}
