use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler, SessionStore, SessionSummary};
use crate::modules::chat::ports::{PaginatedResult, Pagination};

/// 列出会话查询
#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub page: u32,
    pub limit: u32,
}

impl ListSessionsQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

impl Default for ListSessionsQuery {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// 列出会话响应
#[derive(Debug, Clone)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl From<PaginatedResult<SessionSummary>> for ListSessionsResponse {
    fn from(result: PaginatedResult<SessionSummary>) -> Self {
        let has_more = result.has_next();
        Self {
            sessions: result.items,
            total: result.total,
            page: result.page,
            limit: result.limit,
            has_more,
        }
    }
}

/// 列出会话查询处理器
pub struct ListSessionsHandler {
    store: Arc<SessionStore>,
}

impl ListSessionsHandler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryHandler<ListSessionsQuery, ListSessionsResponse> for ListSessionsHandler {
    async fn handle(
        &self,
        query: ListSessionsQuery,
    ) -> Result<ListSessionsResponse, ApplicationError> {
        let pagination = Pagination::new(query.page, query.limit);
        let result = self.store.list(pagination).await?;
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::infrastructure::{
        InMemoryMessageRepository, InMemorySessionRepository,
    };

    #[tokio::test]
    async fn test_list_sessions_pagination() {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ));
        let handler = ListSessionsHandler::new(store.clone());

        for i in 0..5 {
            store.create(Some(format!("Session {}", i))).await.unwrap();
        }

        let response = handler.handle(ListSessionsQuery::new(1, 2)).await.unwrap();
        assert_eq!(response.sessions.len(), 2);
        assert_eq!(response.total, 5);
        assert!(response.has_more);

        let response = handler.handle(ListSessionsQuery::new(3, 2)).await.unwrap();
        assert_eq!(response.sessions.len(), 1);
        assert!(!response.has_more);
    }

    #[tokio::test]
    async fn test_list_sessions_normalizes_paging() {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ));
        let handler = ListSessionsHandler::new(store);

        let response = handler.handle(ListSessionsQuery::new(0, 0)).await.unwrap();
        assert_eq!(response.page, 1);
        assert_eq!(response.limit, 1);
        assert!(response.sessions.is_empty());
    }
}
