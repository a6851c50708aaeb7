//! Onboarding 策略：目标设置、重定向规则与重试

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use dns_onboard_provider::{ProviderError, ZoneSetting};

use crate::error::CoreError;

/// 随机规则名前缀
const RANDOM_RULE_PREFIX: &str = "Redirect_";
/// 随机规则名后缀长度
const RANDOM_SUFFIX_LEN: usize = 5;
/// 确定性规则名前缀
const DETERMINISTIC_RULE_PREFIX: &str = "redirect_";

/// 单个 zone 设置的目标值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingTarget {
    pub setting: ZoneSetting,
    pub value: String,
}

impl SettingTarget {
    pub fn new(setting: ZoneSetting, value: impl Into<String>) -> Self {
        Self {
            setting,
            value: value.into(),
        }
    }
}

/// 重定向规则的目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTarget {
    pub source_pattern: String,
    pub status_code: u16,
    pub destination_url: String,
}

/// 重定向规则的命名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleNaming {
    /// 由域名推导（`redirect_example_com`），已存在同名规则时不再创建
    #[default]
    Deterministic,
    /// `Redirect_` + 5 位随机小写字母数字，每次都创建新规则
    Random,
}

impl RuleNaming {
    /// 为 `domain` 生成规则名
    pub fn rule_name_for(self, domain: &str) -> String {
        match self {
            Self::Deterministic => {
                let slug: String = domain
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() {
                            c.to_ascii_lowercase()
                        } else {
                            '_'
                        }
                    })
                    .collect();
                format!("{DETERMINISTIC_RULE_PREFIX}{slug}")
            }
            Self::Random => {
                let suffix: String = rand::rng()
                    .sample_iter(&Alphanumeric)
                    .take(RANDOM_SUFFIX_LEN)
                    .map(|b| char::from(b).to_ascii_lowercase())
                    .collect();
                format!("{RANDOM_RULE_PREFIX}{suffix}")
            }
        }
    }
}

impl FromStr for RuleNaming {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" => Ok(Self::Deterministic),
            "random" => Ok(Self::Random),
            other => Err(CoreError::ValidationError(format!(
                "unknown rule naming '{other}', expected 'deterministic' or 'random'"
            ))),
        }
    }
}

impl fmt::Display for RuleNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deterministic => "deterministic",
            Self::Random => "random",
        })
    }
}

/// 单个步骤的重试策略
///
/// 只重试瞬时错误（网络、超时、限流）。退避：100ms, 200ms, 400ms, ...，上限 10 秒；
/// 限流且带 `Retry-After` 时使用该值（上限 30 秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次尝试之后的最大重试次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            max_retry_after: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// 不重试
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// 第 `attempt` 次（从 0 开始）失败后是否应重试
    pub fn should_retry(&self, error: &ProviderError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }

    /// 计算第 `attempt` 次失败后的等待时间
    pub fn delay_for(&self, error: &ProviderError, attempt: u32) -> Duration {
        match error.retry_after() {
            Some(secs) => Duration::from_secs(secs).min(self.max_retry_after),
            None => self.backoff_delay(attempt),
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
        self.base_delay
            .saturating_mul(1_u32 << capped_attempt)
            .min(self.max_delay)
    }
}

/// 一次 onboarding 要达成的远端状态
#[derive(Debug, Clone)]
pub struct OnboardingPolicy {
    /// 依次应用的设置
    pub settings: Vec<SettingTarget>,
    pub redirect: RedirectTarget,
    pub rule_naming: RuleNaming,
    pub retry: RetryPolicy,
}

impl OnboardingPolicy {
    /// 默认策略：`security_level=low`，三项开关为 `on`，`/*` 以 301 重定向到 `destination_url`
    pub fn new(destination_url: impl Into<String>) -> Self {
        Self {
            settings: vec![
                SettingTarget::new(ZoneSetting::SecurityLevel, "low"),
                SettingTarget::new(ZoneSetting::AutomaticHttpsRewrites, "on"),
                SettingTarget::new(ZoneSetting::AlwaysUseHttps, "on"),
                SettingTarget::new(ZoneSetting::Brotli, "on"),
            ],
            redirect: RedirectTarget {
                source_pattern: "/*".to_string(),
                status_code: 301,
                destination_url: destination_url.into(),
            },
            rule_naming: RuleNaming::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_security_level(mut self, level: impl Into<String>) -> Self {
        let level = level.into();
        for target in &mut self.settings {
            if target.setting == ZoneSetting::SecurityLevel {
                target.value.clone_from(&level);
            }
        }
        self
    }

    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.redirect.status_code = status_code;
        self
    }

    #[must_use]
    pub fn with_rule_naming(mut self, rule_naming: RuleNaming) -> Self {
        self.rule_naming = rule_naming;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
