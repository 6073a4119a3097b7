use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::super::value_objects::{MessageId, SessionId};

/// 消息角色（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageRole {
    /// 用户消息
    User,
    /// AI 助手消息
    Assistant,
    /// 系统消息
    System,
}

impl MessageRole {
    /// 提供商 API 使用的角色名
    pub fn as_provider_role(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// 助手消息元数据键
pub mod metadata_keys {
    pub const MODEL: &str = "model";
    pub const PROVIDER: &str = "provider";
    pub const PROMPT_TOKENS: &str = "promptTokens";
    pub const COMPLETION_TOKENS: &str = "completionTokens";
}

/// 消息实体
///
/// 属于 Session 聚合。角色在创建时确定，之后不可修改；
/// `sequence` 由存储在追加时分配，表示在会话内的位置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    session_id: SessionId,
    role: MessageRole,
    content: String,
    #[serde(default)]
    sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<HashMap<String, String>>,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(session_id: SessionId, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            role,
            content: content.into(),
            sequence: 0,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// 创建用户消息
    pub fn new_user(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageRole::User, content)
    }

    /// 创建助手消息
    pub fn new_assistant(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageRole::Assistant, content)
    }

    /// 创建系统消息
    pub fn new_system(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageRole::System, content)
    }

    /// 附加一条元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    // Getters
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.metadata.as_ref()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 由存储在追加时调用
    pub(crate) fn assign_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_message() {
        let session_id = SessionId::new();
        let msg = Message::new_user(session_id, "Hello, AI!");

        assert_eq!(msg.role(), MessageRole::User);
        assert_eq!(msg.content(), "Hello, AI!");
        assert_eq!(msg.session_id(), session_id);
        assert!(msg.metadata().is_none());
    }

    #[test]
    fn test_assistant_metadata() {
        let msg = Message::new_assistant(SessionId::new(), "Sure")
            .with_metadata(metadata_keys::MODEL, "gpt-4o")
            .with_metadata(metadata_keys::PROVIDER, "openai");

        assert_eq!(msg.role(), MessageRole::Assistant);
        assert_eq!(msg.metadata_value(metadata_keys::MODEL), Some("gpt-4o"));
        assert_eq!(msg.metadata_value(metadata_keys::PROVIDER), Some("openai"));
        assert_eq!(msg.metadata_value("missing"), None);
    }

    #[test]
    fn test_role_wire_format() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"ASSISTANT\"");
        assert_eq!(MessageRole::System.as_provider_role(), "system");
    }

    #[test]
    fn test_message_without_metadata_omits_field() {
        let msg = Message::new_system(SessionId::new(), "be brief");
        let value = serde_json::to_value(&msg).unwrap();

        assert!(value.get("metadata").is_none());
        assert_eq!(value["role"], "SYSTEM");
        assert_eq!(value["sequence"], 0);
    }
}
