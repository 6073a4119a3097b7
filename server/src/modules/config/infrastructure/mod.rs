// Config Infrastructure Layer
//
// 基础设施层实现配置来源适配器

mod file_repository;
mod memory_repository;

pub use file_repository::*;
pub use memory_repository::*;
