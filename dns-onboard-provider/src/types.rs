use std::fmt;

use serde::{Deserialize, Serialize};

// ============ Credentials ============

/// Bearer token used to authenticate every gateway call.
///
/// The token is a secret: `Debug` and `Display` print a masked form, never the value.
/// Use [`expose`](Self::expose) at the single point where the header is built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short masked form for logs: the last four characters only.
    #[must_use]
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            "****".to_string()
        } else {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("****{tail}")
        }
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiToken").field(&self.masked()).finish()
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

// ============ Zone ============

/// Lifecycle state of a zone as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Active,
    Pending,
    Initializing,
    Moved,
    Deleted,
    ReadOnly,
    /// Any status string this crate does not know about.
    Unknown,
}

impl ZoneStatus {
    /// Parse the provider's status string. Unrecognized values map to `Unknown`.
    pub fn parse(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "pending" => Self::Pending,
            "initializing" => Self::Initializing,
            "moved" => Self::Moved,
            "deleted" => Self::Deleted,
            "read only" | "read_only" => Self::ReadOnly,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Initializing => "initializing",
            Self::Moved => "moved",
            Self::Deleted => "deleted",
            Self::ReadOnly => "read_only",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One domain hosted by the provider.
///
/// Never cached: every command resolves `name -> id` again, so an id may be stale
/// by the time it is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Provider-assigned zone identifier.
    pub id: String,
    /// Domain name (the lookup key).
    pub name: String,
    pub status: ZoneStatus,
    /// Nameservers assigned by the provider, in provider order.
    pub name_servers: Vec<String>,
}

// ============ Settings ============

/// Zone-level configuration properties applied during onboarding.
///
/// Every setting is applied with a single PATCH and is idempotent on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSetting {
    SecurityLevel,
    AutomaticHttpsRewrites,
    AlwaysUseHttps,
    Brotli,
}

impl ZoneSetting {
    /// Path segment of the setting resource (`/zones/{id}/settings/{name}`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecurityLevel => "security_level",
            Self::AutomaticHttpsRewrites => "automatic_https_rewrites",
            Self::AlwaysUseHttps => "always_use_https",
            Self::Brotli => "brotli",
        }
    }
}

impl fmt::Display for ZoneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Redirect rules ============

/// A named rule forwarding matching requests on a zone to a fixed destination.
///
/// Rule names are unique per zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    /// Provider-assigned id. `None` for rules not yet created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Source pattern, e.g. `/*`.
    pub source_pattern: String,
    /// HTTP status used for the redirect, e.g. 301.
    pub status_code: u16,
    pub destination_url: String,
}

impl RedirectRule {
    pub fn new(
        name: impl Into<String>,
        source_pattern: impl Into<String>,
        status_code: u16,
        destination_url: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            source_pattern: source_pattern.into(),
            status_code,
            destination_url: destination_url.into(),
        }
    }

    /// Same source pattern, status code and destination. Ignores id and name.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.source_pattern == other.source_pattern
            && self.status_code == other.status_code
            && self.destination_url == other.destination_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_masked() {
        let token = ApiToken::new("abcdefghijklmnop1234");
        let debug = format!("{token:?}");
        assert!(!debug.contains("abcdefgh"));
        assert!(debug.contains("****1234"));
        assert_eq!(token.to_string(), "****1234");
    }

    #[test]
    fn short_token_fully_masked() {
        assert_eq!(ApiToken::new("short").masked(), "****");
    }

    #[test]
    fn blank_token_is_empty() {
        assert!(ApiToken::new("   ").is_empty());
        assert!(!ApiToken::new("t").is_empty());
    }

    #[test]
    fn zone_status_parse() {
        assert_eq!(ZoneStatus::parse("active"), ZoneStatus::Active);
        assert_eq!(ZoneStatus::parse("pending"), ZoneStatus::Pending);
        assert_eq!(ZoneStatus::parse("moved"), ZoneStatus::Moved);
        assert_eq!(ZoneStatus::parse("read only"), ZoneStatus::ReadOnly);
        assert_eq!(ZoneStatus::parse("something-new"), ZoneStatus::Unknown);
    }

    #[test]
    fn rule_target_ignores_id_and_name() {
        let wanted = RedirectRule::new("redirect_example_com", "/*", 301, "https://a.example/");
        let mut stored = RedirectRule::new("Redirect_x1y2z", "/*", 301, "https://a.example/");
        stored.id = Some("r1".to_string());
        assert!(stored.same_target(&wanted));

        let moved = RedirectRule::new("redirect_example_com", "/*", 301, "https://b.example/");
        assert!(!moved.same_target(&wanted));
        let temporary = RedirectRule::new("redirect_example_com", "/*", 302, "https://a.example/");
        assert!(!temporary.same_target(&wanted));
    }

    #[test]
    fn setting_path_names() {
        assert_eq!(ZoneSetting::SecurityLevel.as_str(), "security_level");
        assert_eq!(
            ZoneSetting::AutomaticHttpsRewrites.as_str(),
            "automatic_https_rewrites"
        );
        assert_eq!(ZoneSetting::AlwaysUseHttps.as_str(), "always_use_https");
        assert_eq!(ZoneSetting::Brotli.as_str(), "brotli");
    }
}
