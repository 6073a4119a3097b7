use async_trait::async_trait;
use thiserror::Error;

use super::super::domain::{Session, SessionId};

/// 仓储错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(e: std::io::Error) -> Self {
        RepositoryError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::SerializationError(e.to_string())
    }
}

/// 分页参数（page 从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const MAX_LIMIT: u32 = 100;

    /// 创建分页参数，page 至少为 1，limit 限制在 1..=MAX_LIMIT
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }

    /// 对已排序的完整列表取当前页
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let offset = self.offset();
        if offset >= items.len() {
            return Vec::new();
        }
        let end = items.len().min(offset + self.limit as usize);
        items[offset..end].to_vec()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// 分页结果
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: usize, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize * self.limit as usize) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// 会话仓储端口
///
/// 所有写操作在返回成功前必须已持久化
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 根据 ID 获取会话
    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepositoryError>;

    /// 保存会话（创建或更新）
    async fn save(&self, session: &Session) -> Result<(), RepositoryError>;

    /// 删除会话，返回删除前是否存在
    async fn delete(&self, id: SessionId) -> Result<bool, RepositoryError>;

    /// 获取所有会话（按更新时间倒序分页）
    async fn find_all(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Session>, RepositoryError>;
}

/// 按更新时间倒序排列，时间相同时按 ID 保证稳定
pub fn sort_newest_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        b.updated_at()
            .cmp(&a.updated_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normalizes_input() {
        let p = Pagination::new(0, 0);
        assert_eq!(p, Pagination { page: 1, limit: 1 });

        let p = Pagination::new(2, 1000);
        assert_eq!(p.limit, Pagination::MAX_LIMIT);
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn test_pagination_slice() {
        let items: Vec<u32> = (0..25).collect();

        assert_eq!(Pagination::new(3, 10).slice(&items), vec![20, 21, 22, 23, 24]);
        assert!(Pagination::new(4, 10).slice(&items).is_empty());
    }

    #[test]
    fn test_has_next() {
        let result = PaginatedResult::new(vec![1, 2], 5, Pagination::new(1, 2));
        assert!(result.has_next());

        let result = PaginatedResult::new(vec![5], 5, Pagination::new(3, 2));
        assert!(!result.has_next());
    }
}
