//! 凭证上下文

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tokio::sync::RwLock;

use dns_onboard_provider::ApiToken;

use crate::error::{CoreError, CoreResult};
use crate::types::SessionId;

/// Token 的作用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialScope {
    /// 整个进程共享一个 token，任何会话的 `/settoken` 都会影响所有会话之后的命令
    #[default]
    Shared,
    /// 每个会话独立的 token，未设置过的会话使用启动时的 token
    PerSession,
}

impl FromStr for CredentialScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-session" | "per_session" | "session" => Ok(Self::PerSession),
            other => Err(CoreError::ValidationError(format!(
                "unknown credential scope '{other}', expected 'shared' or 'per-session'"
            ))),
        }
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::PerSession => "per-session",
        })
    }
}

/// 凭证上下文
///
/// 命令开始时通过 [`get`](Self::get) 取一份 token 快照，之后的 gateway 调用都使用这份快照。
/// [`set`](Self::set) 是唯一的修改入口。
pub struct CredentialContext {
    scope: CredentialScope,
    shared: RwLock<ApiToken>,
    sessions: RwLock<HashMap<SessionId, ApiToken>>,
}

impl CredentialContext {
    /// 以启动时配置的 token 创建
    #[must_use]
    pub fn new(bootstrap: ApiToken, scope: CredentialScope) -> Self {
        Self {
            scope,
            shared: RwLock::new(bootstrap),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> CredentialScope {
        self.scope
    }

    /// 当前对 `session` 生效的 token（快照）
    pub async fn get(&self, session: &SessionId) -> ApiToken {
        if self.scope == CredentialScope::PerSession {
            if let Some(token) = self.sessions.read().await.get(session) {
                return token.clone();
            }
        }
        self.shared.read().await.clone()
    }

    /// 替换 token；空 token 被拒绝
    pub async fn set(&self, session: &SessionId, token: ApiToken) -> CoreResult<()> {
        let token = ApiToken::new(token.expose().trim());
        if token.is_empty() {
            return Err(CoreError::ValidationError("API token is empty".to_string()));
        }

        log::info!(
            "API token updated by session {session} (scope: {}, token: {token})",
            self.scope
        );

        match self.scope {
            CredentialScope::Shared => *self.shared.write().await = token,
            CredentialScope::PerSession => {
                self.sessions.write().await.insert(session.clone(), token);
            }
        }
        Ok(())
    }
}
