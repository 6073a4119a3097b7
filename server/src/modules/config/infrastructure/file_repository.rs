// File Config Repository
//
// 基于 JSON 文件的配置仓储实现

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::modules::config::domain::{AppConfig, ConfigSource};
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 未显式指定时查找的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "palaver.json";

/// JSON 文件配置仓储
pub struct FileConfigRepository {
    /// 配置文件路径
    config_path: PathBuf,
    /// 文件不存在时是否报错（显式指定的路径必须存在）
    required: bool,
}

impl FileConfigRepository {
    /// 可选的配置文件，不存在时使用默认值
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            required: false,
        }
    }

    /// 必须存在的配置文件
    pub fn required(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            required: true,
        }
    }
}

#[async_trait]
impl ConfigRepository for FileConfigRepository {
    async fn load(&self) -> Result<Option<AppConfig>, ConfigError> {
        if !tokio::fs::try_exists(&self.config_path).await? {
            if self.required {
                return Err(ConfigError::NotFound(
                    self.config_path.display().to_string(),
                ));
            }
            debug!(
                "Config file {} not found, using defaults",
                self.config_path.display()
            );
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.config_path).await?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            ConfigError::SerializationError(format!("{}: {}", self.config_path.display(), e))
        })?;

        Ok(Some(config))
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::File(self.config_path.clone())
    }
}
