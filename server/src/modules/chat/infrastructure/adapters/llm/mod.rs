// LLM Adapters
// 各种 LLM 提供商的适配器实现与按模型名解析的注册表

mod claude;
mod echo;
mod http;
mod openai;
mod registry;
mod retry;

pub use claude::*;
pub use echo::*;
pub use openai::*;
pub use registry::*;
pub use retry::*;
