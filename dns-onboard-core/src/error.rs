//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use dns_onboard_provider::ProviderError;

use crate::types::{ProvisioningReport, StepName};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// 域名在当前账户下没有对应的 zone
    #[error("Zone not found for {0}")]
    ZoneNotFound(String),

    /// zone 在解析之后、使用之前被删除
    #[error("Zone {zone_id} for {domain} disappeared while it was being used")]
    StaleZone { domain: String, zone_id: String },

    /// 至少一个变更步骤已生效后，后续步骤失败
    #[error("Onboarding of {domain} stopped at step '{failed_step}': {source}")]
    PartialProvisioningFailure {
        domain: String,
        failed_step: StepName,
        source: Box<CoreError>,
        report: Box<ProvisioningReport>,
    },

    /// 同一域名已有一个进行中的 onboarding
    #[error("Onboarding of {0} is already in progress")]
    ProvisioningInProgress(String),

    /// 没有可以恢复的失败记录
    #[error("No failed onboarding of {0} to resume")]
    NothingToResume(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 无法识别的命令或缺少参数
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// 消息投递失败
    #[error("Notification error: {0}")]
    Notification(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ZoneNotFound(_)
            | Self::StaleZone { .. }
            | Self::ProvisioningInProgress(_)
            | Self::NothingToResume(_)
            | Self::ValidationError(_)
            | Self::InvalidCommand(_) => true,
            Self::PartialProvisioningFailure { source, .. } => source.is_expected(),
            Self::Provider(e) => e.is_expected(),
            Self::Notification(_) => false,
        }
    }

    /// 把 gateway 错误映射到域名语境：`ZoneNotFound` 归一为带域名的核心错误
    pub(crate) fn for_domain(err: ProviderError, domain: &str) -> Self {
        match err {
            ProviderError::ZoneNotFound { .. } => Self::ZoneNotFound(domain.to_string()),
            e => Self::Provider(e),
        }
    }

    /// 已解析出 zone id 之后的调用：`ZoneNotFound` 说明 zone 已失效
    pub(crate) fn for_resolved_zone(err: ProviderError, domain: &str, zone_id: &str) -> Self {
        match err {
            ProviderError::ZoneNotFound { .. } => Self::StaleZone {
                domain: domain.to_string(),
                zone_id: zone_id.to_string(),
            },
            e => Self::Provider(e),
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
