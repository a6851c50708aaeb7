//! 测试辅助模块
//!
//! 提供记录调用的 fake gateway、记录消息的 sink，以及组装好全部服务的 [`TestHarness`]。

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use dns_onboard_provider::{
    ApiToken, ProviderError, RedirectRule, Result as ProviderResult, Zone, ZoneGateway,
    ZoneSetting, ZoneStatus, same_domain,
};

use crate::error::{CoreError, CoreResult};
use crate::services::{
    CommandRouter, CredentialContext, CredentialScope, Notifier, ProvisioningService,
    ServiceContext,
};
use crate::traits::{GatewayFactory, MessageSink};
use crate::types::{OnboardingPolicy, RetryPolicy, SessionId};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn provider_error(message: &str) -> ProviderError {
    ProviderError::Unknown {
        provider: "fake".to_string(),
        raw_code: Some("1000".to_string()),
        raw_message: message.to_string(),
    }
}

// ===== FakeProvider =====

/// gateway 调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOp {
    Resolve(String),
    ListZones,
    Delete(String),
    ApplySetting {
        zone_id: String,
        setting: ZoneSetting,
        value: String,
    },
    ListRules(String),
    CreateRule {
        zone_id: String,
        rule: RedirectRule,
    },
    UpdateRule {
        zone_id: String,
        rule_id: String,
        rule: RedirectRule,
    },
}

/// 调用类别，用于失败注入和断言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Resolve,
    ListZones,
    Delete,
    Setting(ZoneSetting),
    ListRules,
    CreateRule,
    UpdateRule,
}

impl GatewayOp {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Resolve(_) => OpKind::Resolve,
            Self::ListZones => OpKind::ListZones,
            Self::Delete(_) => OpKind::Delete,
            Self::ApplySetting { setting, .. } => OpKind::Setting(*setting),
            Self::ListRules(_) => OpKind::ListRules,
            Self::CreateRule { .. } => OpKind::CreateRule,
            Self::UpdateRule { .. } => OpKind::UpdateRule,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayCall {
    /// 发起调用的 gateway 所绑定的 token
    pub token: String,
    pub op: GatewayOp,
}

struct Failure {
    kind: OpKind,
    error: ProviderError,
    /// `None` 表示一直失败
    remaining: Option<u32>,
}

/// 模拟远端账户状态，所有 [`FakeGateway`] 共享
pub struct FakeProvider {
    zones: Mutex<Vec<Zone>>,
    settings: Mutex<HashMap<String, BTreeMap<&'static str, String>>>,
    rules: Mutex<HashMap<String, Vec<RedirectRule>>>,
    calls: Mutex<Vec<GatewayCall>>,
    failures: Mutex<Vec<Failure>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    next_rule_id: Mutex<u32>,
}

impl FakeProvider {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones: Mutex::new(zones),
            settings: Mutex::new(HashMap::new()),
            rules: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            holds: Mutex::new(HashMap::new()),
            next_rule_id: Mutex::new(1),
        }
    }

    /// example.com（active）与 example.org（pending）
    pub fn with_default_zones() -> Self {
        Self::new(vec![
            zone("zone-example", "example.com", ZoneStatus::Active),
            zone("zone-example-org", "example.org", ZoneStatus::Pending),
        ])
    }

    /// 让 `kind` 类调用返回 `error`；`times` 为 `None` 时一直失败
    pub fn fail_on(&self, kind: OpKind, error: ProviderError, times: Option<u32>) {
        lock(&self.failures).push(Failure {
            kind,
            error,
            remaining: times,
        });
    }

    /// 让 `domain` 的 resolve 调用阻塞，直到返回的 `Notify` 被通知
    pub fn hold_resolve(&self, domain: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.holds).insert(domain.to_string(), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn patch_count(&self) -> usize {
        self.count(|k| matches!(k, OpKind::Setting(_)))
    }

    pub fn post_count(&self) -> usize {
        self.count(|k| k == OpKind::CreateRule)
    }

    pub fn put_count(&self) -> usize {
        self.count(|k| k == OpKind::UpdateRule)
    }

    fn count(&self, pred: impl Fn(OpKind) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c.op.kind())).count()
    }

    pub fn setting(&self, zone_id: &str, setting: ZoneSetting) -> Option<String> {
        lock(&self.settings)
            .get(zone_id)
            .and_then(|s| s.get(setting.as_str()).cloned())
    }

    pub fn settings_snapshot(&self, zone_id: &str) -> BTreeMap<&'static str, String> {
        lock(&self.settings).get(zone_id).cloned().unwrap_or_default()
    }

    pub fn rules(&self, zone_id: &str) -> Vec<RedirectRule> {
        lock(&self.rules).get(zone_id).cloned().unwrap_or_default()
    }

    /// 记录调用并检查失败注入
    fn record(&self, token: &str, op: GatewayOp) -> ProviderResult<()> {
        let kind = op.kind();
        lock(&self.calls).push(GatewayCall {
            token: token.to_string(),
            op,
        });

        let mut failures = lock(&self.failures);
        let Some(index) = failures
            .iter()
            .position(|f| f.kind == kind && f.remaining != Some(0))
        else {
            return Ok(());
        };
        let failure = &mut failures[index];
        if let Some(remaining) = failure.remaining.as_mut() {
            *remaining -= 1;
        }
        Err(failure.error.clone())
    }

    fn find_zone_by_id(&self, zone_id: &str) -> ProviderResult<Zone> {
        lock(&self.zones)
            .iter()
            .find(|z| z.id == zone_id)
            .cloned()
            .ok_or_else(|| zone_not_found(zone_id))
    }
}

fn zone(id: &str, name: &str, status: ZoneStatus) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
        status,
        name_servers: vec![
            "ada.ns.cloudflare.com".to_string(),
            "bob.ns.cloudflare.com".to_string(),
        ],
    }
}

fn zone_not_found(domain: &str) -> ProviderError {
    ProviderError::ZoneNotFound {
        provider: "fake".to_string(),
        domain: domain.to_string(),
        raw_message: None,
    }
}

// ===== FakeGateway =====

/// 绑定到某个 token 的 gateway，状态保存在共享的 [`FakeProvider`] 中
pub struct FakeGateway {
    provider: Arc<FakeProvider>,
    token: ApiToken,
}

#[async_trait]
impl ZoneGateway for FakeGateway {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn resolve_zone(&self, domain: &str) -> ProviderResult<Zone> {
        self.provider
            .record(self.token.expose(), GatewayOp::Resolve(domain.to_string()))?;

        let hold = lock(&self.provider.holds).remove(domain);
        if let Some(notify) = hold {
            notify.notified().await;
        }

        lock(&self.provider.zones)
            .iter()
            .find(|z| same_domain(&z.name, domain))
            .cloned()
            .ok_or_else(|| zone_not_found(domain))
    }

    async fn list_zones(&self) -> ProviderResult<Vec<String>> {
        self.provider
            .record(self.token.expose(), GatewayOp::ListZones)?;
        Ok(lock(&self.provider.zones)
            .iter()
            .map(|z| z.name.clone())
            .collect())
    }

    async fn delete_zone(&self, zone: &Zone) -> ProviderResult<()> {
        self.provider
            .record(self.token.expose(), GatewayOp::Delete(zone.id.clone()))?;
        self.provider.find_zone_by_id(&zone.id)?;
        lock(&self.provider.zones).retain(|z| z.id != zone.id);
        Ok(())
    }

    async fn apply_setting(&self, zone: &Zone, setting: ZoneSetting, value: &str) -> ProviderResult<()> {
        self.provider.record(
            self.token.expose(),
            GatewayOp::ApplySetting {
                zone_id: zone.id.clone(),
                setting,
                value: value.to_string(),
            },
        )?;
        self.provider.find_zone_by_id(&zone.id)?;
        lock(&self.provider.settings)
            .entry(zone.id.clone())
            .or_default()
            .insert(setting.as_str(), value.to_string());
        Ok(())
    }

    async fn list_redirect_rules(&self, zone: &Zone) -> ProviderResult<Vec<RedirectRule>> {
        self.provider
            .record(self.token.expose(), GatewayOp::ListRules(zone.id.clone()))?;
        self.provider.find_zone_by_id(&zone.id)?;
        Ok(self.provider.rules(&zone.id))
    }

    async fn create_redirect_rule(&self, zone: &Zone, rule: &RedirectRule) -> ProviderResult<RedirectRule> {
        self.provider.record(
            self.token.expose(),
            GatewayOp::CreateRule {
                zone_id: zone.id.clone(),
                rule: rule.clone(),
            },
        )?;
        self.provider.find_zone_by_id(&zone.id)?;

        let mut rules = lock(&self.provider.rules);
        let zone_rules = rules.entry(zone.id.clone()).or_default();
        if zone_rules.iter().any(|r| r.name == rule.name) {
            return Err(ProviderError::InvalidParameter {
                provider: "fake".to_string(),
                param: "name".to_string(),
                detail: format!("rule {} already exists", rule.name),
            });
        }

        let mut next_id = lock(&self.provider.next_rule_id);
        let mut created = rule.clone();
        created.id = Some(format!("rule-{next_id}"));
        *next_id += 1;
        zone_rules.push(created.clone());
        Ok(created)
    }

    async fn update_redirect_rule(
        &self,
        zone: &Zone,
        rule_id: &str,
        rule: &RedirectRule,
    ) -> ProviderResult<RedirectRule> {
        self.provider.record(
            self.token.expose(),
            GatewayOp::UpdateRule {
                zone_id: zone.id.clone(),
                rule_id: rule_id.to_string(),
                rule: rule.clone(),
            },
        )?;
        self.provider.find_zone_by_id(&zone.id)?;

        let mut rules = lock(&self.provider.rules);
        let existing = rules
            .get_mut(&zone.id)
            .and_then(|zone_rules| {
                zone_rules
                    .iter_mut()
                    .find(|r| r.id.as_deref() == Some(rule_id))
            })
            .ok_or_else(|| ProviderError::InvalidParameter {
                provider: "fake".to_string(),
                param: "rule_id".to_string(),
                detail: format!("rule {rule_id} does not exist"),
            })?;
        existing.source_pattern.clone_from(&rule.source_pattern);
        existing.status_code = rule.status_code;
        existing.destination_url.clone_from(&rule.destination_url);
        Ok(existing.clone())
    }
}

// ===== FakeGatewayFactory =====

pub struct FakeGatewayFactory {
    provider: Arc<FakeProvider>,
}

impl FakeGatewayFactory {
    pub fn new(provider: Arc<FakeProvider>) -> Self {
        Self { provider }
    }
}

impl GatewayFactory for FakeGatewayFactory {
    fn create(&self, token: &ApiToken) -> CoreResult<Arc<dyn ZoneGateway>> {
        Ok(Arc::new(FakeGateway {
            provider: self.provider.clone(),
            token: token.clone(),
        }))
    }
}

// ===== RecordingSink =====

/// 记录所有发出的消息
pub struct RecordingSink {
    messages: Mutex<Vec<(SessionId, String)>>,
    attempts: Mutex<usize>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail: false,
        }
    }

    /// 每次投递都失败
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn messages_for(&self, session: &SessionId) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .filter(|(s, _)| s == session)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn all_messages(&self) -> Vec<(SessionId, String)> {
        lock(&self.messages).clone()
    }

    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send_message(&self, session: &SessionId, text: &str) -> CoreResult<()> {
        *lock(&self.attempts) += 1;
        if self.fail {
            return Err(CoreError::Notification("sink unavailable".to_string()));
        }
        lock(&self.messages).push((session.clone(), text.to_string()));
        Ok(())
    }
}

// ===== TestHarness =====

/// 用 fake 组装的完整服务
pub struct TestHarness {
    pub provider: Arc<FakeProvider>,
    pub sink: Arc<RecordingSink>,
    pub ctx: Arc<ServiceContext>,
    pub provisioning: Arc<ProvisioningService>,
    pub router: Arc<CommandRouter>,
}

impl TestHarness {
    pub const BOOTSTRAP_TOKEN: &'static str = "bootstrap-token";
    pub const DESTINATION: &'static str = "https://landing.example.net/";

    pub fn admin() -> SessionId {
        SessionId::from(1)
    }

    /// 默认策略，重试不等待
    pub fn policy() -> OnboardingPolicy {
        OnboardingPolicy::new(Self::DESTINATION)
            .with_retry(RetryPolicy::default().with_base_delay(Duration::ZERO))
    }

    pub fn new() -> Self {
        Self::build(
            FakeProvider::with_default_zones(),
            Self::policy(),
            CredentialScope::Shared,
        )
    }

    pub fn empty() -> Self {
        Self::build(
            FakeProvider::new(Vec::new()),
            Self::policy(),
            CredentialScope::Shared,
        )
    }

    pub fn with_policy(policy: OnboardingPolicy) -> Self {
        Self::build(
            FakeProvider::with_default_zones(),
            policy,
            CredentialScope::Shared,
        )
    }

    pub fn with_scope(scope: CredentialScope) -> Self {
        Self::build(FakeProvider::with_default_zones(), Self::policy(), scope)
    }

    fn build(provider: FakeProvider, policy: OnboardingPolicy, scope: CredentialScope) -> Self {
        let provider = Arc::new(provider);
        let sink = Arc::new(RecordingSink::new());
        let ctx = Arc::new(ServiceContext::new(
            Arc::new(CredentialContext::new(
                ApiToken::new(Self::BOOTSTRAP_TOKEN),
                scope,
            )),
            Arc::new(FakeGatewayFactory::new(provider.clone())),
            Arc::new(Notifier::new(sink.clone(), Some(Self::admin()))),
        ));
        let provisioning = Arc::new(ProvisioningService::new(ctx.clone(), policy));
        let router = Arc::new(CommandRouter::new(ctx.clone(), provisioning.clone()));

        Self {
            provider,
            sink,
            ctx,
            provisioning,
            router,
        }
    }
}
