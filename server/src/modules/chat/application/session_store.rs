use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::turns::SessionLocks;

use crate::modules::chat::domain::{Message, Session, SessionId, DEFAULT_SESSION_TITLE};
use crate::modules::chat::ports::{
    MessageRepository, PaginatedResult, Pagination, RepositoryError, SessionRepository,
};

/// 会话列表条目
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

impl SessionSummary {
    fn new(session: &Session, message_count: usize) -> Self {
        Self {
            id: session.id(),
            title: session.title().to_string(),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
            message_count,
        }
    }
}

/// 会话详情：会话本身及其有序消息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: Session,
    pub messages: Vec<Message>,
}

/// 会话存储
///
/// 组合会话仓储和消息仓储。同一会话的读-改-写（追加时刷新 updated_at、
/// 重命名、删除）在该会话的锁下进行，不同会话互不阻塞。
pub struct SessionStore {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
    default_title: String,
    locks: SessionLocks,
}

impl SessionStore {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            sessions,
            messages,
            default_title: DEFAULT_SESSION_TITLE.to_string(),
            locks: SessionLocks::new(),
        }
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.default_title = title;
        }
        self
    }

    /// 创建会话，标题为空时使用默认标题
    pub async fn create(&self, title: Option<String>) -> Result<Session, RepositoryError> {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.default_title.clone());
        let session = Session::new(Some(title));

        self.sessions.save(&session).await?;
        info!("[session_store] Created session {}", session.id());
        Ok(session)
    }

    pub async fn get(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        self.sessions.get(id).await
    }

    /// 按 sequence 排序的会话消息
    pub async fn messages(&self, id: SessionId) -> Result<Vec<Message>, RepositoryError> {
        self.messages.find_by_session(id).await
    }

    pub async fn last_message(&self, id: SessionId) -> Result<Option<Message>, RepositoryError> {
        self.messages.find_last_by_session(id).await
    }

    /// 追加消息到所属会话末尾并刷新会话的 updated_at
    ///
    /// 消息写入是最后一步：返回错误时消息一定没有被保存，
    /// 最多留下一个提前刷新的 updated_at
    pub async fn append(&self, message: Message) -> Result<Message, RepositoryError> {
        let session_id = message.session_id();
        let _guard = self.locks.lock(session_id).await;

        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(session_id.to_string()))?;

        session.touch();
        self.sessions.save(&session).await?;

        self.messages.append(message).await
    }

    /// 按 updated_at 倒序分页列出会话摘要
    pub async fn list(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResult<SessionSummary>, RepositoryError> {
        let page = self.sessions.find_all(pagination).await?;

        let mut summaries = Vec::with_capacity(page.items.len());
        for session in &page.items {
            let count = self.messages.count_by_session(session.id()).await?;
            summaries.push(SessionSummary::new(session, count));
        }

        Ok(PaginatedResult {
            items: summaries,
            total: page.total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn rename(&self, id: SessionId, title: &str) -> Result<Session, RepositoryError> {
        let _guard = self.locks.lock(id).await;

        let mut session = self
            .sessions
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        session.rename(title.trim());
        self.sessions.save(&session).await?;
        Ok(session)
    }

    /// 删除会话及其全部消息，返回删除的消息数；会话不存在时返回 0
    pub async fn delete(&self, id: SessionId) -> Result<usize, RepositoryError> {
        let _guard = self.locks.lock(id).await;

        // 先删消息，中途失败时最多留下一个空会话
        let deleted_messages = self.messages.delete_by_session(id).await?;
        let existed = self.sessions.delete(id).await?;

        if existed {
            info!(
                "[session_store] Deleted session {} ({} messages)",
                id, deleted_messages
            );
        }
        Ok(deleted_messages)
    }
}
