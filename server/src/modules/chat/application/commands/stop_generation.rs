use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler, Dispatcher};
use crate::modules::chat::domain::SessionId;

/// 停止生成命令
#[derive(Debug, Clone)]
pub struct StopGenerationCommand {
    pub session_id: SessionId,
}

impl StopGenerationCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

#[derive(Debug, Clone)]
pub struct StopGenerationResponse {
    /// 是否有正在执行的轮次被取消
    pub cancelled: bool,
}

/// 停止生成处理器
pub struct StopGenerationHandler {
    dispatcher: Arc<Dispatcher>,
}

impl StopGenerationHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl CommandHandler<StopGenerationCommand, StopGenerationResponse> for StopGenerationHandler {
    async fn handle(
        &self,
        command: StopGenerationCommand,
    ) -> Result<StopGenerationResponse, ApplicationError> {
        Ok(StopGenerationResponse {
            cancelled: self.dispatcher.stop(command.session_id),
        })
    }
}
