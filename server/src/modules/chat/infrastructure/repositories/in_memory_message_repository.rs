use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::modules::chat::domain::{Message, SessionId};
use crate::modules::chat::ports::{MessageRepository, RepositoryError};

/// 内存消息仓储（按会话分组）
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<SessionId, Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, mut message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        let session_messages = messages.entry(message.session_id()).or_default();

        message.assign_sequence(session_messages.len() as u64);
        session_messages.push(message.clone());

        Ok(message)
    }

    async fn find_by_session(&self, session_id: SessionId) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(&session_id).cloned().unwrap_or_default())
    }

    async fn find_last_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(&session_id).and_then(|msgs| msgs.last().cloned()))
    }

    async fn count_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(&session_id).map(Vec::len).unwrap_or(0))
    }

    async fn delete_by_session(&self, session_id: SessionId) -> Result<usize, RepositoryError> {
        let mut messages = self.messages.write().await;
        Ok(messages.remove(&session_id).map(|m| m.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_order_round_trip() {
        let repo = InMemoryMessageRepository::new();
        let session_id = SessionId::new();

        let appended: Vec<Message> = {
            let mut out = Vec::new();
            for i in 0..10 {
                out.push(
                    repo.append(Message::new_user(session_id, format!("m{}", i)))
                        .await
                        .unwrap(),
                );
            }
            out
        };

        let stored = repo.find_by_session(session_id).await.unwrap();
        assert_eq!(stored, appended);
        assert!(stored.iter().enumerate().all(|(i, m)| m.sequence() == i as u64));
    }

    #[tokio::test]
    async fn test_concurrent_appends_get_distinct_sequences() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let session_id = SessionId::new();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.append(Message::new_user(session_id, format!("m{}", i)))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let stored = repo.find_by_session(session_id).await.unwrap();
        assert_eq!(stored.len(), 50);
        let mut sequences: Vec<u64> = stored.iter().map(|m| m.sequence()).collect();
        sequences.dedup();
        assert_eq!(sequences, (0..50).collect::<Vec<u64>>());
    }
}
