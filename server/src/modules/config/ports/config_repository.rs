// Config Repository Port
//
// 配置来源的抽象

use async_trait::async_trait;

use super::ConfigError;
use crate::modules::config::domain::{AppConfig, ConfigSource};

/// 配置仓储端口
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// 加载配置；来源不存在时返回 None，由调用方使用默认值
    async fn load(&self) -> Result<Option<AppConfig>, ConfigError>;

    /// 配置来源描述，用于日志
    fn source(&self) -> ConfigSource;
}
