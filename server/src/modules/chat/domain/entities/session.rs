use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::value_objects::SessionId;

/// 未指定标题时的默认会话标题
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// 会话实体 - 聚合根
///
/// 消息不直接挂在 Session 上，而是按 session_id 扁平存储，读取时按序重建
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// 创建新会话
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());

        Self {
            id: SessionId::new(),
            title,
            created_at: now,
            updated_at: now,
        }
    }

    // Getters
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // 业务方法

    /// 重命名会话
    pub fn rename(&mut self, new_title: impl Into<String>) {
        self.title = new_title.into();
        self.touch();
    }

    /// 更新修改时间
    pub fn touch(&mut self) {
        self.touch_at(Utc::now());
    }

    /// 以给定时间更新修改时间，时钟回拨时保持原值
    pub fn touch_at(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_create_session() {
        let session = Session::new(Some("Test Session".to_string()));
        assert_eq!(session.title(), "Test Session");
        assert_eq!(session.created_at(), session.updated_at());
    }

    #[test]
    fn test_default_session_title() {
        assert_eq!(Session::default().title(), DEFAULT_SESSION_TITLE);
        assert_eq!(
            Session::new(Some("   ".to_string())).title(),
            DEFAULT_SESSION_TITLE
        );
    }

    #[test]
    fn test_session_rename() {
        let mut session = Session::default();
        let old_updated_at = session.updated_at();

        // 确保时间差异
        std::thread::sleep(std::time::Duration::from_millis(10));

        session.rename("New Title");
        assert_eq!(session.title(), "New Title");
        assert!(session.updated_at() > old_updated_at);
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let mut session = Session::default();
        let before = session.updated_at();

        session.touch_at(before - Duration::seconds(30));
        assert_eq!(session.updated_at(), before);

        session.touch_at(before + Duration::seconds(30));
        assert_eq!(session.updated_at(), before + Duration::seconds(30));
    }
}
