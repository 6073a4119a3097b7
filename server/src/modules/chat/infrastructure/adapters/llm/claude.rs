// Claude Adapter - Anthropic Claude Messages API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{api_url, build_client, classify_send_error, ensure_success};
use crate::modules::chat::domain::{HistoryEntry, MessageRole};
use crate::modules::chat::ports::{
    CompletionRequest, CompletionResponse, LLMPort, LLMProviderConfig, ProviderError, TokenUsage,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Claude API 请求
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ClaudeMessage {
    role: String,
    content: String,
}

/// Claude API 响应
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Claude 适配器
pub struct ClaudeAdapter {
    config: LLMProviderConfig,
    client: Client,
}

impl ClaudeAdapter {
    pub fn new(config: LLMProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Claude 的 messages 数组不接受 system 角色，系统消息合并到顶层 system 字段
    fn split_system(messages: &[HistoryEntry]) -> (Option<String>, Vec<ClaudeMessage>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let conversation = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| ClaudeMessage {
                role: m.role.as_provider_role().to_string(),
                content: m.content.clone(),
            })
            .collect();

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, conversation)
    }

    fn to_claude_request(request: &CompletionRequest) -> ClaudeRequest {
        let (system, messages) = Self::split_system(&request.messages);
        ClaudeRequest {
            model: request.model.clone(),
            messages,
            system,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
        }
    }

    fn into_completion(response: ClaudeResponse) -> Result<CompletionResponse, ProviderError> {
        let texts: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if texts.is_empty() {
            return Err(ProviderError::invalid_response(
                "No text content block in response",
            ));
        }

        Ok(CompletionResponse {
            content: texts.join(""),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
        })
    }
}

#[async_trait]
impl LLMPort for ClaudeAdapter {
    fn provider_id(&self) -> &str {
        &self.config.id
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let claude_request = Self::to_claude_request(&request);

        debug!(
            "Sending Claude messages request: model={}, messages={}",
            claude_request.model,
            claude_request.messages.len()
        );

        let response = self
            .client
            .post(api_url(&self.config.base_url, "messages"))
            .header("x-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&claude_request)
            .send()
            .await
            .map_err(classify_send_error)?;
        let response = ensure_success(&self.config.id, response).await?;

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        Self::into_completion(claude_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::ports::ProviderErrorKind;

    #[test]
    fn test_system_messages_are_lifted() {
        let request = CompletionRequest::new(
            vec![
                HistoryEntry::new(MessageRole::System, "You are terse."),
                HistoryEntry::new(MessageRole::User, "hi"),
                HistoryEntry::new(MessageRole::Assistant, "hello"),
                HistoryEntry::new(MessageRole::User, "how are you"),
            ],
            "claude-3-5-sonnet-20241022",
        );

        let claude = ClaudeAdapter::to_claude_request(&request);

        assert_eq!(claude.system.as_deref(), Some("You are terse."));
        assert_eq!(claude.messages.len(), 3);
        assert_eq!(claude.messages[1].role, "assistant");
        assert_eq!(claude.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = r#"{"id":"msg_1","content":[{"type":"text","text":"Hello"},{"type":"text","text":" there"}],"stop_reason":"end_turn","usage":{"input_tokens":5,"output_tokens":2}}"#;
        let parsed: ClaudeResponse = serde_json::from_str(body).unwrap();
        let completion = ClaudeAdapter::into_completion(parsed).unwrap();

        assert_eq!(completion.content, "Hello there");
        assert_eq!(completion.usage.unwrap().completion_tokens, 2);
    }

    #[test]
    fn test_no_text_block_is_invalid_response() {
        let parsed: ClaudeResponse =
            serde_json::from_str(r#"{"content":[{"type":"tool_use"}]}"#).unwrap();
        let err = ClaudeAdapter::into_completion(parsed).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::InvalidResponse);
    }
}
