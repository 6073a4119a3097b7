use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::super::domain::HistoryEntry;

/// 提供商错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderErrorKind {
    /// 超过调用方给定的时限
    Timeout,
    /// 被提供商限流
    RateLimited,
    /// 响应无法解析或缺少内容
    InvalidResponse,
    /// 其他错误（网络、鉴权、服务端错误等）
    Unknown,
}

impl ProviderErrorKind {
    /// 退避重试是否有意义
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderErrorKind::Timeout | ProviderErrorKind::RateLimited)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::RateLimited => "rate limited",
            ProviderErrorKind::InvalidResponse => "invalid response",
            ProviderErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// 提供商调用错误
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Provider error ({kind}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// 限流时提供商建议的等待秒数
    pub retry_after_secs: Option<u64>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn rate_limited(retry_after_secs: Option<u64>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: "Rate limit exceeded".to_string(),
            retry_after_secs,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }
}

/// 模型解析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No provider is configured for model: {0}")]
    UnknownModel(String),

    #[error("Provider '{provider}' for model '{model}' has no credential configured")]
    MissingCredential { model: String, provider: String },
}

/// LLM 提供商类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Claude,
    Ollama,
    Custom,
    Echo,
}

impl ProviderType {
    /// 该类型是否必须配置 API Key
    pub fn requires_credential(&self) -> bool {
        matches!(
            self,
            ProviderType::OpenAI | ProviderType::Claude | ProviderType::Custom
        )
    }
}

/// 提供商信息（用于模型发现接口）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub provider_type: ProviderType,
    pub model_prefixes: Vec<String>,
    /// 凭证已配置、可以被解析
    pub available: bool,
}

/// 补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// 有序的消息历史
    pub messages: Vec<HistoryEntry>,
    /// 模型 ID
    pub model: String,
    /// 最大生成 token 数
    pub max_tokens: Option<u32>,
    /// 温度参数 (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<HistoryEntry>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temp: Option<f32>) -> Self {
        self.temperature = temp;
        self
    }
}

/// Token 使用统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// 补全响应
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// LLM 服务端口 - 核心抽象接口
///
/// 所有提供商适配器都实现此 trait，调度器不感知具体协议
#[async_trait]
pub trait LLMPort: Send + Sync {
    /// 获取提供商 ID
    fn provider_id(&self) -> &str;

    /// 根据有序历史生成回复
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

/// 解析结果：选中的提供商及其实例
#[derive(Clone)]
pub struct ResolvedProvider {
    pub provider_id: String,
    pub port: Arc<dyn LLMPort>,
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider_id", &self.provider_id)
            .finish()
    }
}

/// 模型名到提供商的解析端口
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self, model: &str) -> Result<ResolvedProvider, ResolveError>;

    /// 列出已配置的提供商
    fn providers(&self) -> Vec<ProviderInfo>;
}

/// LLM 提供商配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LLMProviderConfig {
    pub id: String,
    pub name: String,
    pub provider_type: ProviderType,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// 模型名前缀，最长匹配者胜出
    pub model_prefixes: Vec<String>,
    pub timeout_secs: u64,
    /// 退避重试次数，0 表示不重试
    pub max_retries: u32,
}

impl LLMProviderConfig {
    /// 凭证是否存在（空白字符串视为未配置）
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// 是否可被解析使用
    pub fn is_available(&self) -> bool {
        !self.provider_type.requires_credential() || self.has_credential()
    }

    pub fn openai_default() -> Self {
        Self {
            id: "openai".to_string(),
            name: "OpenAI".to_string(),
            provider_type: ProviderType::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            model_prefixes: vec!["gpt".to_string()],
            ..Default::default()
        }
    }

    pub fn claude_default() -> Self {
        Self {
            id: "claude".to_string(),
            name: "Anthropic".to_string(),
            provider_type: ProviderType::Claude,
            base_url: "https://api.anthropic.com/v1".to_string(),
            model_prefixes: vec!["claude".to_string()],
            ..Default::default()
        }
    }
}

impl Default for LLMProviderConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            provider_type: ProviderType::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model_prefixes: Vec::new(),
            timeout_secs: 60,
            max_retries: 0,
        }
    }
}

impl fmt::Display for LLMProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 不输出 api_key
        write!(
            f,
            "{} ({:?}, {}, prefixes={:?})",
            self.id, self.provider_type, self.base_url, self.model_prefixes
        )
    }
}
