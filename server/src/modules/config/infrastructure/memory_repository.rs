// In-Memory Config Repository
//
// 基于内存的配置仓储实现（用于测试和内嵌启动）

use async_trait::async_trait;

use crate::modules::config::domain::{AppConfig, ConfigSource};
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 内存配置仓储
#[derive(Default)]
pub struct InMemoryConfigRepository {
    config: Option<AppConfig>,
}

impl InMemoryConfigRepository {
    /// 无配置，加载时使用默认值
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn load(&self) -> Result<Option<AppConfig>, ConfigError> {
        Ok(self.config.clone())
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::Default
    }
}
