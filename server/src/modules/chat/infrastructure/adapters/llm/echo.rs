// Echo Adapter - 本地确定性提供商
//
// 不访问网络，回复 "echo: <最后一条用户消息>"，用于开发和测试

use async_trait::async_trait;

use crate::modules::chat::domain::MessageRole;
use crate::modules::chat::ports::{
    CompletionRequest, CompletionResponse, LLMPort, ProviderError, TokenUsage,
};

pub struct EchoAdapter {
    id: String,
}

impl EchoAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for EchoAdapter {
    fn default() -> Self {
        Self::new("echo")
    }
}

#[async_trait]
impl LLMPort for EchoAdapter {
    fn provider_id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .ok_or_else(|| ProviderError::invalid_response("History has no user message"))?;

        let prompt_tokens = request
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count() as u32)
            .sum();
        let content = format!("echo: {}", last_user.content);
        let completion_tokens = content.split_whitespace().count() as u32;

        Ok(CompletionResponse {
            content,
            usage: Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
            }),
        })
    }
}
