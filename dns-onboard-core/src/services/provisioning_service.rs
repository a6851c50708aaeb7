//! 域名 onboarding 流程
//!
//! 固定顺序的步骤：解析 zone → 报告 nameserver → 依次应用设置 → 重定向规则 → 报告成功。
//! 不是事务：任一步骤失败即中止，已生效的变更保留，结果记入报告以便 `/resume`。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::RwLock;

use dns_onboard_provider::{
    ProviderError, RedirectRule, Result as ProviderResult, Zone, ZoneGateway,
};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::services::retry::run_with_retry;
use crate::types::{
    OnboardingPolicy, ProvisioningOutcome, ProvisioningReport, ProvisioningRequest, RuleNaming,
    SessionId, StepName, StepStatus,
};

/// 失败的步骤及原因
struct StepFailure {
    step: StepName,
    cause: CoreError,
}

/// 进行中域名集合的占位，drop 时释放
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    domain: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.domain);
    }
}

/// Onboarding 服务
pub struct ProvisioningService {
    ctx: Arc<ServiceContext>,
    policy: OnboardingPolicy,
    in_flight: Mutex<HashSet<String>>,
    /// 每个域名最近一次尝试的报告
    last_reports: RwLock<HashMap<String, ProvisioningReport>>,
}

impl ProvisioningService {
    /// 创建 onboarding 服务实例
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, policy: OnboardingPolicy) -> Self {
        Self {
            ctx,
            policy,
            in_flight: Mutex::new(HashSet::new()),
            last_reports: RwLock::new(HashMap::new()),
        }
    }

    /// 对 `domain` 执行完整的 onboarding
    ///
    /// 进度、结果和错误都会通知到 `session`；调用方无需再回复。
    pub async fn onboard(&self, session: &SessionId, domain: &str) -> CoreResult<ProvisioningReport> {
        let request = ProvisioningRequest::new(domain, session.clone(), &self.policy);
        self.execute(request).await
    }

    /// 恢复 `domain` 最近一次失败的 onboarding，跳过已生效的变更步骤
    pub async fn resume(&self, session: &SessionId, domain: &str) -> CoreResult<ProvisioningReport> {
        let previous = self
            .last_reports
            .read()
            .await
            .get(domain)
            .filter(|report| !report.is_completed())
            .cloned();

        let Some(previous) = previous else {
            let err = CoreError::NothingToResume(domain.to_string());
            log::warn!("Resume rejected for session {session}: {err}");
            self.ctx.notifier.notify_error(session, &err).await;
            return Err(err);
        };

        let mut request = ProvisioningRequest::new(domain, session.clone(), &self.policy);
        request.carry_over(&previous);
        log::info!(
            "[{}] Resuming {domain} from attempt {}, carrying over {:?}",
            request.id,
            previous.request_id,
            previous.applied_steps()
        );
        self.execute(request).await
    }

    fn try_acquire(&self, domain: &str) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(domain.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            domain: domain.to_string(),
        })
    }

    async fn execute(&self, mut request: ProvisioningRequest) -> CoreResult<ProvisioningReport> {
        let session = request.session.clone();
        let domain = request.domain.clone();
        let notifier = &self.ctx.notifier;

        // token 快照在命令受理时获取
        let gateway = match self.ctx.gateway_for(&session).await {
            Ok(gateway) => gateway,
            Err(e) => {
                log::error!("[{}] Failed to build gateway: {e}", request.id);
                notifier.notify_error(&session, &e).await;
                notifier.notify_admin(&e).await;
                return Err(e);
            }
        };

        let Some(_guard) = self.try_acquire(&domain) else {
            let err = CoreError::ProvisioningInProgress(domain);
            log::warn!("[{}] {err}", request.id);
            notifier.notify_error(&session, &err).await;
            return Err(err);
        };

        log::info!(
            "[{}] Onboarding {domain} for session {session} (rule {})",
            request.id,
            request.rule_name
        );

        let result = self.run_steps(gateway.as_ref(), &mut request).await;
        let outcome = match &result {
            Ok(()) => ProvisioningOutcome::Completed,
            Err(failure) => ProvisioningOutcome::Failed(failure.step),
        };
        let report = request.finish(outcome);
        self.last_reports
            .write()
            .await
            .insert(domain.clone(), report.clone());

        match result {
            Ok(()) => {
                log::info!("[{}] Onboarding {domain} completed", report.request_id);
                notifier.notify(&session, &self.success_message(&domain)).await;
                Ok(report)
            }
            Err(failure) => {
                let show_steps = failure.step.is_mutating();
                let err = Self::classify(&report, failure);
                if err.is_expected() {
                    log::warn!("[{}] {err}", report.request_id);
                } else {
                    log::error!("[{}] {err}", report.request_id);
                }

                let reply = if show_steps {
                    format!("Error: {err}\n{}", report.summary())
                } else {
                    format!("Error: {err}")
                };
                notifier.notify(&session, &reply).await;
                notifier.notify_admin(&err).await;
                Err(err)
            }
        }
    }

    async fn run_steps(
        &self,
        gateway: &dyn ZoneGateway,
        request: &mut ProvisioningRequest,
    ) -> Result<(), StepFailure> {
        let domain = request.domain.clone();
        let session = request.session.clone();
        let retry = self.policy.retry;

        // 1. 解析 zone
        let (result, attempts) =
            run_with_retry(&retry, "resolve zone", || gateway.resolve_zone(&domain)).await;
        let zone = match result {
            Ok(zone) => zone,
            Err(e) => {
                let cause = CoreError::for_domain(e, &domain);
                return Err(Self::fail(request, StepName::ResolveZone, attempts, cause));
            }
        };
        if request.bind_zone(&zone.id) {
            log::warn!(
                "[{}] Zone id of {domain} changed to {}, re-applying every step",
                request.id,
                zone.id
            );
        }
        request.mark(StepName::ResolveZone, StepStatus::Succeeded { attempts });
        log::info!(
            "[{}] Resolved {domain} to zone {} ({})",
            request.id,
            zone.id,
            zone.status
        );

        // 2. 报告 nameserver
        let notifier = &self.ctx.notifier;
        notifier.notify(&session, &nameserver_message(&zone)).await;
        notifier
            .notify(&session, "Configuring additional settings...")
            .await;
        request.mark(
            StepName::ReportNameservers,
            StepStatus::Succeeded { attempts: 1 },
        );

        // 3-6. zone 设置
        for target in &self.policy.settings {
            let step = StepName::ApplySetting(target.setting);
            if request.is_carried_over(step) {
                log::info!("[{}] Skipping {step}, already applied", request.id);
                continue;
            }

            let (result, attempts) = run_with_retry(&retry, target.setting.as_str(), || {
                gateway.apply_setting(&zone, target.setting, &target.value)
            })
            .await;
            if let Err(e) = result {
                let cause = CoreError::for_resolved_zone(e, &domain, &zone.id);
                return Err(Self::fail(request, step, attempts, cause));
            }
            log::debug!("[{}] {} = {}", request.id, target.setting, target.value);
            request.mark(step, StepStatus::Succeeded { attempts });
        }

        // 7. 重定向规则
        let step = StepName::RedirectRule;
        if request.is_carried_over(step) {
            log::info!("[{}] Skipping {step}, already applied", request.id);
            return Ok(());
        }

        let redirect = &self.policy.redirect;
        let rule = RedirectRule::new(
            request.rule_name.clone(),
            redirect.source_pattern.clone(),
            redirect.status_code,
            redirect.destination_url.clone(),
        );
        let (result, attempts) = run_with_retry(&retry, "redirect rule", || {
            self.ensure_redirect_rule(gateway, &zone, &rule)
        })
        .await;
        match result {
            Ok(created) => {
                log::info!(
                    "[{}] Redirect rule {} ({}) -> {}",
                    request.id,
                    created.name,
                    created.id.as_deref().unwrap_or("-"),
                    created.destination_url
                );
                request.mark(step, StepStatus::Succeeded { attempts });
                Ok(())
            }
            Err(e) => {
                let cause = CoreError::for_resolved_zone(e, &domain, &zone.id);
                Err(Self::fail(request, step, attempts, cause))
            }
        }
    }

    /// 创建重定向规则
    ///
    /// 确定性命名时先查同名规则：内容一致则直接返回，不一致则就地更新为当前策略，
    /// 重试与恢复都只会留下一条指向当前目标的规则。
    async fn ensure_redirect_rule(
        &self,
        gateway: &dyn ZoneGateway,
        zone: &Zone,
        rule: &RedirectRule,
    ) -> ProviderResult<RedirectRule> {
        if self.policy.rule_naming == RuleNaming::Deterministic {
            let existing = gateway.list_redirect_rules(zone).await?;
            if let Some(found) = existing.into_iter().find(|r| r.name == rule.name) {
                if found.same_target(rule) {
                    log::info!("Redirect rule {} already present on {}", found.name, zone.name);
                    return Ok(found);
                }
                let Some(rule_id) = found.id.as_deref() else {
                    return Err(ProviderError::ParseError {
                        provider: gateway.id().to_string(),
                        detail: format!("redirect rule {} has no id", found.name),
                    });
                };
                log::warn!(
                    "Redirect rule {} on {} points to {} ({}), updating to {} ({})",
                    found.name,
                    zone.name,
                    found.destination_url,
                    found.status_code,
                    rule.destination_url,
                    rule.status_code
                );
                return gateway.update_redirect_rule(zone, rule_id, rule).await;
            }
        }
        gateway.create_redirect_rule(zone, rule).await
    }

    fn fail(
        request: &mut ProvisioningRequest,
        step: StepName,
        attempts: u32,
        cause: CoreError,
    ) -> StepFailure {
        request.mark(
            step,
            StepStatus::Failed {
                attempts,
                error: cause.to_string(),
            },
        );
        StepFailure { step, cause }
    }

    /// 已有变更生效后的失败归为部分失败，附带完整报告
    fn classify(report: &ProvisioningReport, failure: StepFailure) -> CoreError {
        if failure.step.is_mutating() && report.any_mutation_applied() {
            CoreError::PartialProvisioningFailure {
                domain: report.domain.clone(),
                failed_step: failure.step,
                source: Box::new(failure.cause),
                report: Box::new(report.clone()),
            }
        } else {
            failure.cause
        }
    }

    fn success_message(&self, domain: &str) -> String {
        let redirect = &self.policy.redirect;
        format!(
            "Domain {domain} added and configured successfully! Redirect set to {} ({}).",
            redirect.destination_url, redirect.status_code
        )
    }
}

fn nameserver_message(zone: &Zone) -> String {
    if zone.name_servers.is_empty() {
        format!("Nameservers for {}: none assigned yet", zone.name)
    } else {
        format!(
            "Nameservers for {}: {}",
            zone.name,
            zone.name_servers.join(", ")
        )
    }
}
