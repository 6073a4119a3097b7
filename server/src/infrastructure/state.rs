use std::sync::Arc;

use crate::modules::chat::ChatModule;

/// 应用全局状态
///
/// 会话、消息和提供商都由 ChatModule 管理，这里只持有模块容器
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatModule>,
}

impl AppState {
    pub fn new(chat: ChatModule) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}
