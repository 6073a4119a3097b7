use async_trait::async_trait;

use super::super::domain::{Message, SessionId};
use super::session_repository::RepositoryError;

/// 消息仓储端口
///
/// 消息按 session_id 扁平存储，只能追加，不能单独删除
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 追加消息到会话末尾
    ///
    /// 实现必须在同一把写锁内分配 sequence 并持久化，
    /// 并发追加不会得到相同的 sequence
    async fn append(&self, message: Message) -> Result<Message, RepositoryError>;

    /// 获取会话的所有消息（按 sequence 升序）
    async fn find_by_session(&self, session_id: SessionId) -> Result<Vec<Message>, RepositoryError>;

    /// 获取会话的最后一条消息
    async fn find_last_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Message>, RepositoryError>;

    /// 获取会话的消息数量
    async fn count_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError>;

    /// 删除会话的所有消息，返回删除数量
    async fn delete_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError>;
}
