//! 消息通知

use std::fmt;
use std::sync::Arc;

use crate::traits::MessageSink;
use crate::types::SessionId;

/// 通知服务
///
/// 投递为尽力而为：失败只记录 `warn` 日志，不重试也不向上传播。
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    admin: Option<SessionId>,
}

impl Notifier {
    #[must_use]
    pub fn new(sink: Arc<dyn MessageSink>, admin: Option<SessionId>) -> Self {
        Self { sink, admin }
    }

    /// 向会话发送消息
    pub async fn notify(&self, session: &SessionId, text: &str) {
        if let Err(e) = self.sink.send_message(session, text).await {
            log::warn!("Failed to deliver message to {session}: {e}");
        }
    }

    /// 向会话发送 `Error: <cause>`
    pub async fn notify_error(&self, session: &SessionId, error: &(dyn fmt::Display + Sync)) {
        self.notify(session, &format!("Error: {error}")).await;
    }

    /// 向管理员发送错误副本
    pub async fn notify_admin(&self, error: &(dyn fmt::Display + Sync)) {
        let Some(admin) = &self.admin else {
            log::debug!("No admin session configured, skipping admin notification");
            return;
        };
        self.notify(admin, &format!("Error occurred: {error}")).await;
    }
}
