//! Onboarding 过程与结果的类型定义

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dns_onboard_provider::ZoneSetting;

use super::{OnboardingPolicy, SessionId};

/// Onboarding 的步骤，按执行顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "setting", rename_all = "snake_case")]
pub enum StepName {
    ResolveZone,
    ReportNameservers,
    ApplySetting(ZoneSetting),
    RedirectRule,
}

impl StepName {
    /// 是否会修改远端状态
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::ApplySetting(_) | Self::RedirectRule)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolveZone => f.write_str("resolve zone"),
            Self::ReportNameservers => f.write_str("report nameservers"),
            Self::ApplySetting(setting) => f.write_str(setting.as_str()),
            Self::RedirectRule => f.write_str("redirect rule"),
        }
    }
}

/// 步骤状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Succeeded { attempts: u32 },
    /// 上一次失败的尝试中已成功，本次恢复时跳过
    CarriedOver,
    Failed { attempts: u32, error: String },
}

impl StepStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::CarriedOver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step: StepName,
    pub status: StepStatus,
}

/// 一次 onboarding 尝试，执行完毕后转为 [`ProvisioningReport`]
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub id: Uuid,
    pub domain: String,
    pub session: SessionId,
    pub steps: Vec<StepRecord>,
    pub rule_name: String,
    pub zone_id: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl ProvisioningRequest {
    /// 按策略生成完整步骤表，全部为 `Pending`
    pub fn new(domain: impl Into<String>, session: SessionId, policy: &OnboardingPolicy) -> Self {
        let domain = domain.into();
        let mut steps = vec![
            StepRecord {
                step: StepName::ResolveZone,
                status: StepStatus::Pending,
            },
            StepRecord {
                step: StepName::ReportNameservers,
                status: StepStatus::Pending,
            },
        ];
        steps.extend(policy.settings.iter().map(|target| StepRecord {
            step: StepName::ApplySetting(target.setting),
            status: StepStatus::Pending,
        }));
        steps.push(StepRecord {
            step: StepName::RedirectRule,
            status: StepStatus::Pending,
        });

        Self {
            id: Uuid::new_v4(),
            rule_name: policy.rule_naming.rule_name_for(&domain),
            domain,
            session,
            steps,
            zone_id: None,
            started_at: Utc::now(),
        }
    }

    /// 继承上一次失败尝试中已成功的变更步骤，并沿用其规则名与 zone id
    pub fn carry_over(&mut self, previous: &ProvisioningReport) {
        self.rule_name.clone_from(&previous.rule_name);
        self.zone_id.clone_from(&previous.zone_id);
        for record in &mut self.steps {
            if !record.step.is_mutating() {
                continue;
            }
            if previous.status_of(record.step).is_some_and(StepStatus::is_done) {
                record.status = StepStatus::CarriedOver;
            }
        }
    }

    /// 记录解析到的 zone id
    ///
    /// 与继承来的 zone id 不同时（zone 被删除后重建），继承的步骤全部作废，返回 `true`。
    pub fn bind_zone(&mut self, zone_id: &str) -> bool {
        let replaced = self.zone_id.as_deref().is_some_and(|prev| prev != zone_id);
        if replaced {
            for record in &mut self.steps {
                if record.status == StepStatus::CarriedOver {
                    record.status = StepStatus::Pending;
                }
            }
        }
        self.zone_id = Some(zone_id.to_string());
        replaced
    }

    pub fn status_of(&self, step: StepName) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    pub fn is_carried_over(&self, step: StepName) -> bool {
        matches!(self.status_of(step), Some(StepStatus::CarriedOver))
    }

    pub(crate) fn mark(&mut self, step: StepName, status: StepStatus) {
        if let Some(record) = self.steps.iter_mut().find(|r| r.step == step) {
            record.status = status;
        }
    }

    pub fn finish(self, outcome: ProvisioningOutcome) -> ProvisioningReport {
        ProvisioningReport {
            request_id: self.id,
            domain: self.domain,
            zone_id: self.zone_id,
            rule_name: self.rule_name,
            steps: self.steps,
            outcome,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "step", rename_all = "snake_case")]
pub enum ProvisioningOutcome {
    Completed,
    Failed(StepName),
}

/// 一次 onboarding 尝试的终态报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningReport {
    pub request_id: Uuid,
    pub domain: String,
    pub zone_id: Option<String>,
    pub rule_name: String,
    pub steps: Vec<StepRecord>,
    pub outcome: ProvisioningOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProvisioningReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == ProvisioningOutcome::Completed
    }

    pub fn failed_step(&self) -> Option<StepName> {
        match self.outcome {
            ProvisioningOutcome::Failed(step) => Some(step),
            ProvisioningOutcome::Completed => None,
        }
    }

    pub fn status_of(&self, step: StepName) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    /// 是否已有变更步骤生效（本次成功或继承自上次）
    pub fn any_mutation_applied(&self) -> bool {
        self.steps
            .iter()
            .any(|r| r.step.is_mutating() && r.status.is_done())
    }

    /// 已完成的变更步骤
    pub fn applied_steps(&self) -> Vec<StepName> {
        self.steps
            .iter()
            .filter(|r| r.step.is_mutating() && r.status.is_done())
            .map(|r| r.step)
            .collect()
    }

    /// 逐行列出每个步骤的状态，用于失败回复
    pub fn summary(&self) -> String {
        self.steps
            .iter()
            .map(|record| match &record.status {
                StepStatus::Succeeded { .. } => format!("✔ {}", record.step),
                StepStatus::CarriedOver => format!("✔ {} (already applied)", record.step),
                StepStatus::Failed { error, .. } => format!("✘ {}: {error}", record.step),
                StepStatus::Pending => format!("· {} (not run)", record.step),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
