use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::super::{ApplicationError, CommandHandler, Dispatcher, TurnOutcome};
use crate::modules::chat::domain::{Message, MessageId, SessionId};

/// 发送消息命令
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    /// 会话 ID，为空时新建会话
    pub session_id: Option<SessionId>,
    /// 用户消息内容
    pub content: String,
    /// 模型 ID，为空时使用默认模型
    pub model: Option<String>,
    /// 提供商调用时限，为空时使用配置值
    pub timeout: Option<Duration>,
}

impl SendMessageCommand {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            session_id: None,
            content: content.into(),
            model: None,
            timeout: None,
        }
    }

    pub fn in_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// 发送消息响应
#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    /// 助手回复
    pub message: Message,
    pub session_id: SessionId,
    /// 本轮追加的用户消息
    pub user_message_id: Option<MessageId>,
}

impl From<TurnOutcome> for SendMessageResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            message: outcome.message,
            session_id: outcome.session_id,
            user_message_id: outcome.user_message_id,
        }
    }
}

/// 发送消息命令处理器
pub struct SendMessageHandler {
    dispatcher: Arc<Dispatcher>,
}

impl SendMessageHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl CommandHandler<SendMessageCommand, SendMessageResponse> for SendMessageHandler {
    async fn handle(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        self.dispatcher
            .send_message(
                &command.content,
                command.session_id,
                command.model.as_deref(),
                command.timeout,
            )
            .await
            .map(SendMessageResponse::from)
    }
}
