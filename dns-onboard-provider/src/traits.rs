use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{RedirectRule, Zone, ZoneSetting};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（Cloudflare 数字码，或 `HTTP <status>`）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// 错误上下文信息（内部使用）
/// 用于在映射错误时提供额外信息
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 域名或 zone id（用于 `ZoneNotFound`）
    pub domain: Option<String>,
    /// 设置名称（用于 `InvalidParameter`）
    pub setting: Option<String>,
}

impl ErrorContext {
    pub fn zone(zone: &Zone) -> Self {
        Self {
            domain: Some(zone.name.clone()),
            setting: None,
        }
    }
}

/// Provider 错误映射 Trait（内部使用）
/// Provider 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 返回 Provider 标识符
    fn provider_name(&self) -> &'static str;

    /// 将原始 API 错误映射到统一错误类型
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// 快捷方法：解析错误
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// 快捷方法：未知错误（fallback）
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Domain-shaped façade over the provider API.
///
/// Every method is exactly one network round trip (`list_zones` one per page) and
/// never retries. An implementation is bound to one access token for its lifetime;
/// build a new gateway to act with a different token.
#[async_trait]
pub trait ZoneGateway: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// Look up a zone by exact domain name.
    ///
    /// Returns [`ProviderError::ZoneNotFound`] when no zone's name equals `domain`.
    async fn resolve_zone(&self, domain: &str) -> Result<Zone>;

    /// Names of every zone visible to the token.
    async fn list_zones(&self) -> Result<Vec<String>>;

    /// Remove the zone from the account.
    async fn delete_zone(&self, zone: &Zone) -> Result<()>;

    /// Set one zone setting to `value`. No read-before-write.
    async fn apply_setting(&self, zone: &Zone, setting: ZoneSetting, value: &str) -> Result<()>;

    /// Redirect rules currently configured on the zone.
    async fn list_redirect_rules(&self, zone: &Zone) -> Result<Vec<RedirectRule>>;

    /// Create a redirect rule. Not idempotent: the provider rejects duplicate names,
    /// and distinct names always produce distinct rules.
    async fn create_redirect_rule(&self, zone: &Zone, rule: &RedirectRule) -> Result<RedirectRule>;

    /// Replace the source, status code and destination of the rule with id `rule_id`.
    async fn update_redirect_rule(
        &self,
        zone: &Zone,
        rule_id: &str,
        rule: &RedirectRule,
    ) -> Result<RedirectRule>;
}
