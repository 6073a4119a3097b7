use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::super::{ApplicationError, CommandHandler, Dispatcher};
use super::SendMessageResponse;
use crate::modules::chat::domain::SessionId;

/// 重新生成命令
///
/// 为会话末尾尚未得到回复的用户消息生成回复，不重复追加用户消息。
/// 常用于换一个模型重试失败的轮次。
#[derive(Debug, Clone)]
pub struct RegenerateCommand {
    pub session_id: SessionId,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
}

impl RegenerateCommand {
    pub fn new(session_id: SessionId, model: Option<String>, timeout: Option<Duration>) -> Self {
        Self {
            session_id,
            model,
            timeout,
        }
    }
}

/// 重新生成处理器
pub struct RegenerateHandler {
    dispatcher: Arc<Dispatcher>,
}

impl RegenerateHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl CommandHandler<RegenerateCommand, SendMessageResponse> for RegenerateHandler {
    async fn handle(
        &self,
        command: RegenerateCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        self.dispatcher
            .regenerate(command.session_id, command.model.as_deref(), command.timeout)
            .await
            .map(SendMessageResponse::from)
    }
}
