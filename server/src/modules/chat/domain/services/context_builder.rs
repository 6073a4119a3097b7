use serde::{Deserialize, Serialize};

use super::super::entities::{Message, MessageRole};

/// 提供商看到的一条历史记录：(角色, 文本)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self::new(message.role(), message.content())
    }
}

/// 上下文构建器
///
/// 领域服务：把会话消息转换为发送给提供商的有序历史
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    /// 最多保留的最近消息数，None 表示完整历史
    max_messages: Option<usize>,
    /// 系统提示词
    system_prompt: Option<String>,
}

impl ContextBuilder {
    /// 完整历史、无系统提示词
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = Some(max_messages);
        self
    }

    /// 设置系统提示词
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    /// 构建上下文
    ///
    /// `messages` 必须已按 sequence 排好序，且包含本轮的用户消息
    pub fn build(&self, messages: &[Message]) -> Vec<HistoryEntry> {
        let start = match self.max_messages {
            Some(max) if messages.len() > max => Self::trim_start(messages, messages.len() - max),
            _ => 0,
        };

        let mut context = Vec::with_capacity(messages.len() - start + 1);

        if let Some(ref prompt) = self.system_prompt {
            context.push(HistoryEntry::new(MessageRole::System, prompt.clone()));
        }

        context.extend(messages[start..].iter().map(HistoryEntry::from));
        context
    }

    /// 截断后的历史必须以用户消息开头（Anthropic 拒绝以助手消息开头的对话）
    fn trim_start(messages: &[Message], start: usize) -> usize {
        messages[start..]
            .iter()
            .position(|m| m.role() == MessageRole::User)
            .map_or(start, |offset| start + offset)
    }
}
