// Chat Infrastructure - Repositories
//
// 仓储实现：
// - InMemory*Repository: 内存仓储，用于测试和临时运行
// - File*Repository: JSON 文件持久化仓储，默认后端

mod file_message_repository;
mod file_session_repository;
mod in_memory_message_repository;
mod in_memory_session_repository;
mod json_file;
#[cfg(test)]
mod faulty;

pub use file_message_repository::*;
pub use file_session_repository::*;
pub use in_memory_message_repository::*;
pub use in_memory_session_repository::*;
#[cfg(test)]
pub use faulty::*;
