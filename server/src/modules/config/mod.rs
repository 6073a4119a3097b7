// Config Module
//
// 配置管理模块，采用六边形架构
//
// 层次结构:
// - domain: 领域层，包含配置实体、值对象和校验规则
// - ports: 端口层，定义配置来源的抽象接口
// - infrastructure: 基础设施层，实现具体的配置来源适配器
// - application: 应用层，合并配置来源并应用环境变量覆盖

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型

// Domain
pub use domain::{
    AppConfig, ChatConfig, ConfigSource, ServerConfig, StorageBackend, StorageConfig,
};

// Ports
pub use ports::{ConfigError, ConfigRepository};

// Infrastructure
pub use infrastructure::{FileConfigRepository, InMemoryConfigRepository, DEFAULT_CONFIG_FILE};

// Application
pub use application::{env_vars, ConfigLoader};
