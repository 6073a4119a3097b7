// 测试用仓储：包装内存仓储，按脚本注入写失败或写延迟

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{InMemoryMessageRepository, InMemorySessionRepository};
use crate::modules::chat::domain::{Message, Session, SessionId};
use crate::modules::chat::ports::{
    MessageRepository, PaginatedResult, Pagination, RepositoryError, SessionRepository,
};

fn disk_full() -> RepositoryError {
    RepositoryError::StorageError("disk full".to_string())
}

/// 前 `ok_saves` 次 save 成功，之后全部失败；可为指定会话的 save 加延迟
pub struct FaultySessionRepository {
    inner: InMemorySessionRepository,
    ok_saves: usize,
    saves: AtomicUsize,
    slow: Option<(SessionId, Duration)>,
}

impl FaultySessionRepository {
    pub fn failing_after(ok_saves: usize) -> Self {
        Self {
            inner: InMemorySessionRepository::new(),
            ok_saves,
            saves: AtomicUsize::new(0),
            slow: None,
        }
    }

    pub fn slow_for(session_id: SessionId, delay: Duration) -> Self {
        Self {
            slow: Some((session_id, delay)),
            ..Self::failing_after(usize::MAX)
        }
    }
}

#[async_trait]
impl SessionRepository for FaultySessionRepository {
    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        self.inner.get(id).await
    }

    async fn save(&self, session: &Session) -> Result<(), RepositoryError> {
        if matches!(self.slow, Some((id, _)) if id == session.id()) {
            if let Some((_, delay)) = self.slow {
                tokio::time::sleep(delay).await;
            }
        }
        if self.saves.fetch_add(1, Ordering::SeqCst) >= self.ok_saves {
            return Err(disk_full());
        }
        self.inner.save(session).await
    }

    async fn delete(&self, id: SessionId) -> Result<bool, RepositoryError> {
        self.inner.delete(id).await
    }

    async fn find_all(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Session>, RepositoryError> {
        self.inner.find_all(pagination).await
    }
}

/// 前 `ok_appends` 次 append 成功，之后全部失败
pub struct FaultyMessageRepository {
    inner: InMemoryMessageRepository,
    ok_appends: usize,
    appends: AtomicUsize,
}

impl FaultyMessageRepository {
    pub fn failing_after(ok_appends: usize) -> Self {
        Self {
            inner: InMemoryMessageRepository::new(),
            ok_appends,
            appends: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MessageRepository for FaultyMessageRepository {
    async fn append(&self, message: Message) -> Result<Message, RepositoryError> {
        if self.appends.fetch_add(1, Ordering::SeqCst) >= self.ok_appends {
            return Err(disk_full());
        }
        self.inner.append(message).await
    }

    async fn find_by_session(&self, session_id: SessionId) -> Result<Vec<Message>, RepositoryError> {
        self.inner.find_by_session(session_id).await
    }

    async fn find_last_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Message>, RepositoryError> {
        self.inner.find_last_by_session(session_id).await
    }

    async fn count_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError> {
        self.inner.count_by_session(session_id).await
    }

    async fn delete_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError> {
        self.inner.delete_by_session(session_id).await
    }
}
