use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::modules::chat::domain::{Session, SessionId};
use crate::modules::chat::ports::{
    sort_newest_first, PaginatedResult, Pagination, RepositoryError, SessionRepository,
};

/// 内存会话仓储
///
/// 用于测试和 `storage.backend = "memory"` 的临时运行，进程退出即丢失
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(&id).is_some())
    }

    async fn find_all(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Session>, RepositoryError> {
        let sessions = self.sessions.read().await;

        let mut all_sessions: Vec<Session> = sessions.values().cloned().collect();
        sort_newest_first(&mut all_sessions);

        let items = pagination.slice(&all_sessions);
        Ok(PaginatedResult::new(items, all_sessions.len(), pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = InMemorySessionRepository::new();
        let session = Session::new(Some("Test".to_string()));
        let id = session.id();

        repo.save(&session).await.unwrap();
        let retrieved = repo.get(id).await.unwrap();

        assert_eq!(retrieved.unwrap().title(), "Test");
        assert!(repo.get(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pagination_newest_first() {
        let repo = InMemorySessionRepository::new();

        // 创建 25 个会话
        for i in 0..25 {
            let session = Session::new(Some(format!("Session {}", i)));
            repo.save(&session).await.unwrap();
        }

        let page1 = repo.find_all(Pagination::new(1, 10)).await.unwrap();
        assert_eq!(page1.items.len(), 10);
        assert_eq!(page1.total, 25);
        assert!(page1.has_next());
        assert!(page1
            .items
            .windows(2)
            .all(|w| w[0].updated_at() >= w[1].updated_at()));

        let page3 = repo.find_all(Pagination::new(3, 10)).await.unwrap();
        assert_eq!(page3.items.len(), 5);
        assert!(!page3.has_next());
    }
}
