// OpenAI 兼容适配器
//
// 同时用于 OpenAI、Ollama 以及其他兼容 /chat/completions 的自定义端点

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{api_url, build_client, classify_send_error, ensure_success};
use crate::modules::chat::ports::{
    CompletionRequest, CompletionResponse, LLMPort, LLMProviderConfig, ProviderError, TokenUsage,
};

/// OpenAI API 适配器
pub struct OpenAIAdapter {
    client: Client,
    config: LLMProviderConfig,
}

impl OpenAIAdapter {
    /// 创建新的 OpenAI 适配器
    pub fn new(config: LLMProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// 转换为 OpenAI 请求格式
    fn to_openai_request(request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_provider_role().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// 从响应中取出回复文本
    fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response("No choices in response"))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::invalid_response("Choice has no text content"))?;

        Ok(CompletionResponse {
            content,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl LLMPort for OpenAIAdapter {
    fn provider_id(&self) -> &str {
        &self.config.id
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let openai_request = Self::to_openai_request(&request);

        debug!(
            "Sending completion request to {}: model={}, messages={}",
            self.config.id,
            openai_request.model,
            openai_request.messages.len()
        );

        let mut builder = self
            .client
            .post(api_url(&self.config.base_url, "chat/completions"))
            .json(&openai_request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(classify_send_error)?;
        let response = ensure_success(&self.config.id, response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        Self::into_completion(openai_response)
    }
}

// OpenAI API 类型定义

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{HistoryEntry, MessageRole};
    use crate::modules::chat::ports::ProviderErrorKind;

    #[test]
    fn test_request_maps_roles() {
        let request = CompletionRequest::new(
            vec![
                HistoryEntry::new(MessageRole::System, "be nice"),
                HistoryEntry::new(MessageRole::User, "hi"),
            ],
            "gpt-4o",
        )
        .with_temperature(Some(0.7));

        let json = serde_json::to_value(OpenAIAdapter::to_openai_request(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"id":"chatcmpl-1","choices":[{"message":{"role":"assistant","content":"Hello!"},"finish_reason":"stop"}],"usage":{"prompt_tokens":9,"completion_tokens":2,"total_tokens":11}}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        let completion = OpenAIAdapter::into_completion(parsed).unwrap();

        assert_eq!(completion.content, "Hello!");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                prompt_tokens: 9,
                completion_tokens: 2
            })
        );
    }

    #[test]
    fn test_empty_choices_is_invalid_response() {
        let parsed: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = OpenAIAdapter::into_completion(parsed).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::InvalidResponse);
    }
}
