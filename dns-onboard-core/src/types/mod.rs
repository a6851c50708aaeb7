//! 类型定义模块

mod command;
mod policy;
mod provisioning;
mod session;

pub use command::Command;
pub use policy::{OnboardingPolicy, RedirectTarget, RetryPolicy, RuleNaming, SettingTarget};
pub use provisioning::{
    ProvisioningOutcome, ProvisioningReport, ProvisioningRequest, StepName, StepRecord, StepStatus,
};
pub use session::SessionId;

// Re-export provider 库的公共类型
pub use dns_onboard_provider::{ApiToken, RedirectRule, Zone, ZoneSetting, ZoneStatus};
