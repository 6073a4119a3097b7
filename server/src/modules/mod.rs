// Modules Layer - 业务模块
//
// 按照六边形架构组织的业务模块：
// - chat: 会话存储与模型调度
// - config: 配置加载

pub mod chat;
pub mod config;

pub use chat::ChatModule;
