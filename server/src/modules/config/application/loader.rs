// Config Loader
//
// 加载顺序：默认值 -> 配置文件 -> 环境变量覆盖 -> 校验

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::modules::chat::ProviderType;
use crate::modules::config::domain::{AppConfig, ConfigSource, StorageBackend};
use crate::modules::config::infrastructure::{FileConfigRepository, DEFAULT_CONFIG_FILE};
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 环境变量名
pub mod env_vars {
    pub const CONFIG_PATH: &str = "PALAVER_CONFIG";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const DEFAULT_MODEL: &str = "PALAVER_DEFAULT_MODEL";
    pub const HOST: &str = "PALAVER_HOST";
    pub const PORT: &str = "PALAVER_PORT";
    pub const DATA_DIR: &str = "PALAVER_DATA_DIR";
    pub const STORAGE: &str = "PALAVER_STORAGE";
}

/// 配置加载器
pub struct ConfigLoader {
    repository: Arc<dyn ConfigRepository>,
    env: HashMap<String, String>,
}

impl ConfigLoader {
    pub fn new(repository: Arc<dyn ConfigRepository>) -> Self {
        Self {
            repository,
            env: HashMap::new(),
        }
    }

    /// 从进程环境创建：`PALAVER_CONFIG` 指定的文件必须存在，
    /// 否则尝试当前目录下的 palaver.json
    pub fn from_env() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();

        let repository: Arc<dyn ConfigRepository> = match env.get(env_vars::CONFIG_PATH) {
            Some(path) if !path.trim().is_empty() => {
                Arc::new(FileConfigRepository::required(PathBuf::from(path)))
            }
            _ => Arc::new(FileConfigRepository::new(DEFAULT_CONFIG_FILE)),
        };

        Self::new(repository).with_env(env)
    }

    /// 替换用于覆盖的环境变量
    pub fn with_env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// 加载并校验配置
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut sources = vec![ConfigSource::Default];

        let mut config = match self.repository.load().await? {
            Some(config) => {
                sources.push(self.repository.source());
                config
            }
            None => AppConfig::default(),
        };

        sources.extend(self.apply_env(&mut config)?);

        config
            .validate()
            .map_err(|errors| ConfigError::ValidationError { errors })?;

        let sources: Vec<String> = sources.iter().map(ToString::to_string).collect();
        info!("Configuration loaded from {}", sources.join(", "));
        Ok(config)
    }

    fn var(&self, name: &str) -> Option<&str> {
        self.env
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 应用环境变量覆盖，返回生效的变量
    fn apply_env(&self, config: &mut AppConfig) -> Result<Vec<ConfigSource>, ConfigError> {
        let mut applied = Vec::new();

        for (var, provider_type) in [
            (env_vars::OPENAI_API_KEY, ProviderType::OpenAI),
            (env_vars::ANTHROPIC_API_KEY, ProviderType::Claude),
        ] {
            if let Some(key) = self.var(var) {
                for provider in config
                    .providers
                    .iter_mut()
                    .filter(|p| p.provider_type == provider_type)
                {
                    debug!("Using {} for provider '{}'", var, provider.id);
                    provider.api_key = Some(key.to_string());
                }
                applied.push(ConfigSource::Env(var.to_string()));
            }
        }

        if let Some(model) = self.var(env_vars::DEFAULT_MODEL) {
            config.chat.default_model = model.to_string();
            applied.push(ConfigSource::Env(env_vars::DEFAULT_MODEL.to_string()));
        }

        if let Some(host) = self.var(env_vars::HOST) {
            config.server.host = host.to_string();
            applied.push(ConfigSource::Env(env_vars::HOST.to_string()));
        }

        if let Some(port) = self.var(env_vars::PORT) {
            config.server.port = port.parse().map_err(|_| {
                ConfigError::Invalid(format!("{} is not a valid port: {}", env_vars::PORT, port))
            })?;
            applied.push(ConfigSource::Env(env_vars::PORT.to_string()));
        }

        if let Some(dir) = self.var(env_vars::DATA_DIR) {
            config.storage.data_dir = PathBuf::from(dir);
            applied.push(ConfigSource::Env(env_vars::DATA_DIR.to_string()));
        }

        if let Some(backend) = self.var(env_vars::STORAGE) {
            config.storage.backend = backend
                .parse::<StorageBackend>()
                .map_err(ConfigError::Invalid)?;
            applied.push(ConfigSource::Env(env_vars::STORAGE.to_string()));
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::config::infrastructure::InMemoryConfigRepository;

    fn loader(config: Option<AppConfig>) -> ConfigLoader {
        let repository = match config {
            Some(config) => InMemoryConfigRepository::with_config(config),
            None => InMemoryConfigRepository::new(),
        };
        ConfigLoader::new(Arc::new(repository))
    }

    #[tokio::test]
    async fn test_defaults_without_file_or_env() {
        let config = loader(None).load().await.unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.providers.iter().all(|p| p.api_key.is_none()));
    }

    #[tokio::test]
    async fn test_env_overrides() {
        let config = loader(None)
            .with_env([
                ("OPENAI_API_KEY", "sk-test"),
                ("PALAVER_DEFAULT_MODEL", "claude-3-5-sonnet-20241022"),
                ("PALAVER_PORT", "9090"),
                ("PALAVER_STORAGE", "memory"),
                ("PALAVER_DATA_DIR", "/tmp/palaver"),
            ])
            .load()
            .await
            .unwrap();

        let openai = config.providers.iter().find(|p| p.id == "openai").unwrap();
        let claude = config.providers.iter().find(|p| p.id == "claude").unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
        assert!(claude.api_key.is_none());

        assert_eq!(config.chat.default_model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/palaver"));
    }

    #[tokio::test]
    async fn test_env_overrides_file_values() {
        let mut file_config = AppConfig::default();
        file_config.server.host = "0.0.0.0".to_string();
        file_config.chat.default_model = "gpt-4o".to_string();

        let config = loader(Some(file_config))
            .with_env([("PALAVER_DEFAULT_MODEL", "gpt-4o-mini")])
            .load()
            .await
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chat.default_model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_invalid_port_is_rejected() {
        let result = loader(None)
            .with_env([("PALAVER_PORT", "eighty")])
            .load()
            .await;

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_invalid_file_config_fails_validation() {
        let mut file_config = AppConfig::default();
        file_config.chat.provider_timeout_secs = 0;

        let result = loader(Some(file_config)).load().await;
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
