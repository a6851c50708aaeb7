//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareGateway;

/// Cloudflare error code mapping
/// Reference: <https://api.cloudflare.com/#getting-started-responses>
///
/// Codes of the form `HTTP <status>` come from non-2xx responses whose body
/// was not a Cloudflare envelope.
impl ProviderErrorMapper for CloudflareGateway {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            // Authentication error
            // 6003: Invalid request headers
            // 6103: Invalid format for X-Auth-Key header
            // 6111: Invalid format for Authorization header
            // 9109: Unauthorized to access requested resource / Max auth failures reached
            // 10000: Authentication error
            Some("6003" | "6103" | "6111" | "9109" | "10000" | "HTTP 401") => {
                ProviderError::InvalidCredentials {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }

            Some("HTTP 403") => ProviderError::PermissionDenied {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            // Zone does not exist (or the id went stale)
            // 1001: Invalid zone identifier
            // 7000: No route for that URI
            // 7003: Could not route to /path. perhaps your object identifier is invalid?
            Some("1001" | "7000" | "7003") => ProviderError::ZoneNotFound {
                provider: self.provider_name().to_string(),
                domain: context.domain.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // Invalid parameter
            // 1004: Validation error
            // 1006: Invalid setting name
            // 1007: Invalid value for zone setting
            Some(code @ ("1004" | "1006" | "1007")) => {
                let param = match code {
                    "1006" => "setting".to_string(),
                    "1007" => context.setting.unwrap_or_else(|| "value".to_string()),
                    _ => "general".to_string(),
                };
                ProviderError::InvalidParameter {
                    provider: self.provider_name().to_string(),
                    param,
                    detail: raw.message,
                }
            }

            // Other error fallback
            _ => self.unknown_error(raw),
        }
    }
}
