// 文件持久化消息仓储实现
//
// 消息按会话分组存储在一个 JSON 文件中，组内顺序即对话顺序

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::json_file;
use crate::modules::chat::domain::{Message, SessionId};
use crate::modules::chat::ports::{MessageRepository, RepositoryError};

const MESSAGES_FILE: &str = "messages.json";

/// 持久化数据结构
#[derive(Debug, Serialize, Deserialize, Default)]
struct MessageStore {
    /// 按会话 ID 分组的消息
    messages_by_session: HashMap<SessionId, Vec<Message>>,
}

/// 文件持久化消息仓储
pub struct FileMessageRepository {
    store: RwLock<MessageStore>,
    file_path: PathBuf,
}

impl FileMessageRepository {
    /// 创建新的文件消息仓储
    ///
    /// # Arguments
    /// * `data_dir` - 数据目录路径
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let file_path = json_file::prepare(data_dir.as_ref(), MESSAGES_FILE).await?;
        let mut store: MessageStore = json_file::load_or_default(&file_path).await?;

        // 手工编辑过的文件也按 sequence 排好
        for messages in store.messages_by_session.values_mut() {
            messages.sort_by_key(|m| m.sequence());
        }

        Ok(Self {
            store: RwLock::new(store),
            file_path,
        })
    }
}

#[async_trait]
impl MessageRepository for FileMessageRepository {
    async fn append(&self, mut message: Message) -> Result<Message, RepositoryError> {
        let mut store = self.store.write().await;
        let session_id = message.session_id();

        let messages = store.messages_by_session.entry(session_id).or_default();
        let next = messages.last().map(|m| m.sequence() + 1).unwrap_or(0);
        message.assign_sequence(next);
        messages.push(message.clone());

        if let Err(e) = json_file::write_atomic(&self.file_path, &*store).await {
            if let Some(messages) = store.messages_by_session.get_mut(&session_id) {
                messages.pop();
                if messages.is_empty() {
                    store.messages_by_session.remove(&session_id);
                }
            }
            return Err(e);
        }

        Ok(message)
    }

    async fn find_by_session(&self, session_id: SessionId) -> Result<Vec<Message>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .messages_by_session
            .get(&session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_last_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Message>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .messages_by_session
            .get(&session_id)
            .and_then(|msgs| msgs.last())
            .cloned())
    }

    async fn count_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .messages_by_session
            .get(&session_id)
            .map(Vec::len)
            .unwrap_or(0))
    }

    async fn delete_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError> {
        let mut store = self.store.write().await;
        let Some(removed) = store.messages_by_session.remove(&session_id) else {
            return Ok(0);
        };
        let count = removed.len();

        if let Err(e) = json_file::write_atomic(&self.file_path, &*store).await {
            store.messages_by_session.insert(session_id, removed);
            return Err(e);
        }

        Ok(count)
    }
}
