use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler, SessionDetail, SessionStore};
use crate::modules::chat::domain::SessionId;

/// 获取会话查询
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

impl GetSessionQuery {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// 获取会话查询处理器
pub struct GetSessionHandler {
    store: Arc<SessionStore>,
}

impl GetSessionHandler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryHandler<GetSessionQuery, SessionDetail> for GetSessionHandler {
    async fn handle(&self, query: GetSessionQuery) -> Result<SessionDetail, ApplicationError> {
        let session = self
            .store
            .get(query.session_id)
            .await?
            .ok_or_else(|| ApplicationError::SessionNotFound(query.session_id.to_string()))?;
        let messages = self.store.messages(query.session_id).await?;

        Ok(SessionDetail { session, messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::Message;
    use crate::modules::chat::infrastructure::{
        InMemoryMessageRepository, InMemorySessionRepository,
    };

    fn handler() -> (GetSessionHandler, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ));
        (GetSessionHandler::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_get_existing_session_with_messages() {
        let (handler, store) = handler();
        let session = store.create(Some("Test".to_string())).await.unwrap();
        store
            .append(Message::new_user(session.id(), "hi"))
            .await
            .unwrap();

        let detail = handler
            .handle(GetSessionQuery::new(session.id()))
            .await
            .unwrap();

        assert_eq!(detail.session.title(), "Test");
        assert_eq!(detail.messages.len(), 1);
        assert_eq!(detail.messages[0].content(), "hi");
    }

    #[tokio::test]
    async fn test_get_nonexistent_session() {
        let (handler, _) = handler();

        let result = handler.handle(GetSessionQuery::new(SessionId::new())).await;

        assert!(matches!(result, Err(ApplicationError::SessionNotFound(_))));
    }
}
