// Config Ports Layer
//
// 端口层定义配置模块与外部世界的接口

mod config_error;
mod config_repository;

pub use config_error::*;
pub use config_repository::*;
