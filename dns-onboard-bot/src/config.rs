//! Bot configuration, read once from the environment at startup.

use anyhow::{Context, Result, bail};
use reqwest::Url;

use dns_onboard_core::CredentialScope;
use dns_onboard_core::types::{ApiToken, OnboardingPolicy, RetryPolicy, RuleNaming, SessionId};

const SECURITY_LEVELS: &[&str] = &[
    "off",
    "essentially_off",
    "low",
    "medium",
    "high",
    "under_attack",
];
const REDIRECT_STATUS_CODES: &[u16] = &[301, 302, 307, 308];

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: ApiToken,
    /// Token every session starts with.
    pub cloudflare_token: ApiToken,
    /// Chat that receives a copy of every error. Admin copies are off when unset.
    pub admin_chat: Option<SessionId>,
    pub redirect_destination: String,
    pub redirect_status: u16,
    pub security_level: String,
    pub credential_scope: CredentialScope,
    pub rule_naming: RuleNaming,
    pub step_max_retries: u32,
    pub cloudflare_api_base: Option<String>,
    pub telegram_api_base: Option<String>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).with_context(|| format!("{key} is not set"));

        let telegram_token = ApiToken::new(require("TELEGRAM_BOT_TOKEN")?);
        let cloudflare_token = ApiToken::new(require("CLOUDFLARE_API_TOKEN")?);

        let admin_chat = get("ADMIN_TELEGRAM_ID")
            .map(|id| {
                id.parse::<i64>()
                    .map(SessionId::from)
                    .with_context(|| format!("ADMIN_TELEGRAM_ID must be a numeric chat id, got '{id}'"))
            })
            .transpose()?;

        let redirect_destination = require("REDIRECT_DESTINATION_URL")?;
        validate_destination(&redirect_destination)?;

        let redirect_status = match get("REDIRECT_STATUS_CODE") {
            Some(raw) => {
                let code = raw
                    .parse::<u16>()
                    .with_context(|| format!("REDIRECT_STATUS_CODE must be a number, got '{raw}'"))?;
                if !REDIRECT_STATUS_CODES.contains(&code) {
                    bail!("REDIRECT_STATUS_CODE must be one of {REDIRECT_STATUS_CODES:?}, got {code}");
                }
                code
            }
            None => 301,
        };

        let security_level = get("SECURITY_LEVEL").map_or_else(|| "low".to_string(), |v| v.to_ascii_lowercase());
        if !SECURITY_LEVELS.contains(&security_level.as_str()) {
            bail!("SECURITY_LEVEL must be one of {SECURITY_LEVELS:?}, got '{security_level}'");
        }

        let credential_scope = get("CREDENTIAL_SCOPE")
            .map(|v| v.parse::<CredentialScope>())
            .transpose()
            .context("invalid CREDENTIAL_SCOPE")?
            .unwrap_or_default();

        let rule_naming = get("RULE_NAMING")
            .map(|v| v.parse::<RuleNaming>())
            .transpose()
            .context("invalid RULE_NAMING")?
            .unwrap_or_default();

        let step_max_retries = get("STEP_MAX_RETRIES")
            .map(|v| {
                v.parse::<u32>()
                    .with_context(|| format!("STEP_MAX_RETRIES must be a non-negative integer, got '{v}'"))
            })
            .transpose()?
            .unwrap_or(RetryPolicy::default().max_retries);

        Ok(Self {
            telegram_token,
            cloudflare_token,
            admin_chat,
            redirect_destination,
            redirect_status,
            security_level,
            credential_scope,
            rule_naming,
            step_max_retries,
            cloudflare_api_base: get("CLOUDFLARE_API_BASE"),
            telegram_api_base: get("TELEGRAM_API_BASE"),
        })
    }

    /// Onboarding targets derived from this configuration.
    pub fn onboarding_policy(&self) -> OnboardingPolicy {
        OnboardingPolicy::new(self.redirect_destination.clone())
            .with_security_level(self.security_level.clone())
            .with_status_code(self.redirect_status)
            .with_rule_naming(self.rule_naming)
            .with_retry(RetryPolicy::default().with_max_retries(self.step_max_retries))
    }
}

fn validate_destination(raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("REDIRECT_DESTINATION_URL is not a valid URL: '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        bail!("REDIRECT_DESTINATION_URL must be an http(s) URL with a host, got '{raw}'");
    }
    Ok(())
}
