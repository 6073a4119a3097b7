// Chat Ports Layer
// 端口定义了模块与外部世界的接口

mod llm_port;
mod message_repository;
mod session_repository;

pub use llm_port::*;
pub use message_repository::*;
pub use session_repository::*;
