// Config Domain Entities
//
// 配置领域实体定义

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use super::value_objects::StorageBackend;
use crate::modules::chat::domain::DEFAULT_SESSION_TITLE;
use crate::modules::chat::{ChatSettings, LLMProviderConfig};

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// 监听地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// 对话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    pub default_model: String,
    pub default_title: String,
    pub provider_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// 发送给提供商的最近消息数，None 表示完整历史
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history_messages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatConfig {
    /// 转换为调度器配置
    pub fn settings(&self) -> ChatSettings {
        ChatSettings {
            default_model: self.default_model.clone(),
            default_title: self.default_title.clone(),
            provider_timeout: Duration::from_secs(self.provider_timeout_secs),
            system_prompt: self.system_prompt.clone(),
            max_history_messages: self.max_history_messages,
            temperature: self.temperature,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-3.5-turbo".to_string(),
            default_title: DEFAULT_SESSION_TITLE.to_string(),
            provider_timeout_secs: 60,
            system_prompt: None,
            max_history_messages: None,
            temperature: Some(0.7),
        }
    }
}

/// 应用配置聚合根
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
    pub providers: Vec<LLMProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            chat: ChatConfig::default(),
            providers: vec![
                LLMProviderConfig::openai_default(),
                LLMProviderConfig::claude_default(),
            ],
        }
    }
}

impl AppConfig {
    /// 创建新的默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("Server host must not be empty".to_string());
        }

        if self.chat.default_model.trim().is_empty() {
            errors.push("Default model must not be empty".to_string());
        }
        if self.chat.provider_timeout_secs == 0 {
            errors.push("Provider timeout must be greater than zero".to_string());
        }
        if self.chat.max_history_messages == Some(0) {
            errors.push("maxHistoryMessages must be at least 1".to_string());
        }
        if let Some(t) = self.chat.temperature {
            if !(0.0..=2.0).contains(&t) {
                errors.push("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                errors.push("Provider id must not be empty".to_string());
            } else if !seen.insert(provider.id.as_str()) {
                errors.push(format!("Duplicate provider id: {}", provider.id));
            }
            if provider.timeout_secs == 0 {
                errors.push(format!(
                    "Provider '{}' timeout must be greater than zero",
                    provider.id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
