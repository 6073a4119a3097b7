// 文件持久化会话仓储实现
//
// 使用 JSON 文件存储会话数据，每次写操作在持有写锁期间完成落盘，
// 落盘失败时回滚内存状态

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::json_file;
use crate::modules::chat::domain::{Session, SessionId};
use crate::modules::chat::ports::{
    sort_newest_first, PaginatedResult, Pagination, RepositoryError, SessionRepository,
};

const SESSIONS_FILE: &str = "sessions.json";

/// 持久化数据结构
#[derive(Debug, Serialize, Deserialize, Default)]
struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

/// 文件持久化会话仓储
pub struct FileSessionRepository {
    store: RwLock<SessionStore>,
    file_path: PathBuf,
}

impl FileSessionRepository {
    /// 创建新的文件会话仓储
    ///
    /// # Arguments
    /// * `data_dir` - 数据目录路径
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let file_path = json_file::prepare(data_dir.as_ref(), SESSIONS_FILE).await?;
        let store: SessionStore = json_file::load_or_default(&file_path).await?;

        tracing::debug!(
            "Loaded {} sessions from {}",
            store.sessions.len(),
            file_path.display()
        );

        Ok(Self {
            store: RwLock::new(store),
            file_path,
        })
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.sessions.get(&id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        let previous = store.sessions.insert(session.id(), session.clone());

        if let Err(e) = json_file::write_atomic(&self.file_path, &*store).await {
            match previous {
                Some(old) => store.sessions.insert(session.id(), old),
                None => store.sessions.remove(&session.id()),
            };
            return Err(e);
        }

        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<bool, RepositoryError> {
        let mut store = self.store.write().await;
        let Some(removed) = store.sessions.remove(&id) else {
            return Ok(false);
        };

        if let Err(e) = json_file::write_atomic(&self.file_path, &*store).await {
            store.sessions.insert(id, removed);
            return Err(e);
        }

        Ok(true)
    }

    async fn find_all(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Session>, RepositoryError> {
        let store = self.store.read().await;

        let mut all_sessions: Vec<Session> = store.sessions.values().cloned().collect();
        sort_newest_first(&mut all_sessions);

        let items = pagination.slice(&all_sessions);
        Ok(PaginatedResult::new(items, all_sessions.len(), pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path()).await.unwrap();

        let session = Session::new(Some("Test".to_string()));
        let id = session.id();

        repo.save(&session).await.unwrap();
        let retrieved = repo.get(id).await.unwrap();

        assert_eq!(retrieved.unwrap().title(), "Test");
    }

    #[tokio::test]
    async fn test_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        let session = Session::new(Some("Persistent".to_string()));
        let id = session.id();

        {
            let repo = FileSessionRepository::new(&path).await.unwrap();
            repo.save(&session).await.unwrap();
        }

        // 重新加载仓储，验证数据持久化
        {
            let repo = FileSessionRepository::new(&path).await.unwrap();
            let retrieved = repo.get(id).await.unwrap();

            assert_eq!(retrieved, Some(session));
        }
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path()).await.unwrap();

        let session = Session::new(Some("ToDelete".to_string()));
        let id = session.id();

        repo.save(&session).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_some());

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());

        let reopened = FileSessionRepository::new(temp_dir.path()).await.unwrap();
        assert!(reopened.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_to_open() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(temp_dir.path().join(SESSIONS_FILE), "[1, 2")
            .await
            .unwrap();

        let result = FileSessionRepository::new(temp_dir.path()).await;
        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));
    }
}
