use std::sync::Arc;
use tracing::{info, warn};

use crate::modules::chat::ports::{
    LLMPort, LLMProviderConfig, ProviderError, ProviderInfo, ProviderResolver, ProviderType,
    ResolveError, ResolvedProvider,
};

use super::{ClaudeAdapter, EchoAdapter, OpenAIAdapter, RetryPolicy, RetryingAdapter};

/// 注册表中的一个提供商
struct RegistryEntry {
    config: LLMProviderConfig,
    /// 凭证缺失时为 None
    port: Option<Arc<dyn LLMPort>>,
}

/// 提供商注册表
///
/// 构建时一次性检查凭证并创建适配器实例；之后只读，解析无需加锁。
/// 解析规则：模型名（忽略大小写）的最长匹配前缀决定提供商，
/// 并列时取先配置者。
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    /// 根据配置创建注册表
    pub fn from_configs(configs: Vec<LLMProviderConfig>) -> Result<Self, ProviderError> {
        let mut entries = Vec::with_capacity(configs.len());

        for config in configs {
            let port = if config.is_available() {
                Some(Self::create_adapter(&config)?)
            } else {
                warn!(
                    "Provider '{}' has no credential configured; models {:?} will be rejected",
                    config.id, config.model_prefixes
                );
                None
            };
            info!("Registered provider {}", config);
            entries.push(RegistryEntry { config, port });
        }

        Ok(Self { entries })
    }

    /// 空注册表
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 直接注册一个已构建的适配器（测试或内嵌提供商使用）
    pub fn with_port(
        mut self,
        id: impl Into<String>,
        prefixes: &[&str],
        port: Arc<dyn LLMPort>,
    ) -> Self {
        let id = id.into();
        let config = LLMProviderConfig {
            name: id.clone(),
            id,
            provider_type: ProviderType::Custom,
            model_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        };
        self.entries.push(RegistryEntry {
            config,
            port: Some(port),
        });
        self
    }

    /// 根据配置创建适配器
    fn create_adapter(config: &LLMProviderConfig) -> Result<Arc<dyn LLMPort>, ProviderError> {
        let adapter: Arc<dyn LLMPort> = match config.provider_type {
            ProviderType::OpenAI | ProviderType::Ollama | ProviderType::Custom => {
                // 自定义提供商使用与 OpenAI 兼容的 API
                Arc::new(OpenAIAdapter::new(config.clone())?)
            }
            ProviderType::Claude => Arc::new(ClaudeAdapter::new(config.clone())?),
            ProviderType::Echo => Arc::new(EchoAdapter::new(config.id.clone())),
        };

        if config.max_retries > 0 {
            return Ok(Arc::new(RetryingAdapter::new(
                adapter,
                RetryPolicy::new(config.max_retries),
            )));
        }
        Ok(adapter)
    }

    /// 找到最长匹配前缀的条目
    fn best_match(&self, model: &str) -> Option<&RegistryEntry> {
        let model = model.trim().to_lowercase();
        let mut best: Option<(&RegistryEntry, usize)> = None;

        for entry in &self.entries {
            for prefix in &entry.config.model_prefixes {
                let prefix = prefix.to_lowercase();
                if !model.starts_with(&prefix) {
                    continue;
                }
                if best.map_or(true, |(_, len)| prefix.len() > len) {
                    best = Some((entry, prefix.len()));
                }
            }
        }

        best.map(|(entry, _)| entry)
    }

    /// 获取已注册的提供商数量
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl ProviderResolver for ProviderRegistry {
    fn resolve(&self, model: &str) -> Result<ResolvedProvider, ResolveError> {
        let entry = self
            .best_match(model)
            .ok_or_else(|| ResolveError::UnknownModel(model.to_string()))?;

        let port = entry
            .port
            .clone()
            .ok_or_else(|| ResolveError::MissingCredential {
                model: model.to_string(),
                provider: entry.config.id.clone(),
            })?;

        Ok(ResolvedProvider {
            provider_id: entry.config.id.clone(),
            port,
        })
    }

    fn providers(&self) -> Vec<ProviderInfo> {
        self.entries
            .iter()
            .map(|entry| ProviderInfo {
                id: entry.config.id.clone(),
                name: entry.config.name.clone(),
                provider_type: entry.config.provider_type,
                model_prefixes: entry.config.model_prefixes.clone(),
                available: entry.port.is_some(),
            })
            .collect()
    }
}
