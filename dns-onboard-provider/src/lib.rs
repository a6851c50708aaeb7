//! # dns-onboard-provider
//!
//! A narrow, typed gateway over the [Cloudflare](https://www.cloudflare.com/) v4 API,
//! covering exactly what zone onboarding needs: resolve a domain to its zone, list
//! and delete zones, patch zone settings, and list/create redirect rules.
//!
//! ## Feature Flags
//!
//! ### TLS Backend
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls. Recommended for static and cross-compiled builds.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dns_onboard_provider::{create_gateway, ApiToken, ZoneGateway, ZoneSetting};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = create_gateway(ApiToken::new("your-token"), None)?;
//!
//!     let zone = gateway.resolve_zone("example.com").await?;
//!     println!("{} ({}) -> {:?}", zone.name, zone.status, zone.name_servers);
//!
//!     gateway.apply_setting(&zone, ZoneSetting::Brotli, "on").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All gateway operations return [`Result<T, ProviderError>`](ProviderError).
//!
//! - [`ProviderError::ZoneNotFound`]: no zone with that exact name (or a stale zone id)
//! - [`ProviderError::InvalidCredentials`]: authentication failed
//! - [`ProviderError::RateLimited`]: API rate limit exceeded (retryable)
//! - [`ProviderError::NetworkError`]: network connectivity issue (retryable)
//!
//! The gateway performs exactly one round trip per call and never retries;
//! [`ProviderError::is_retryable`] tells callers which failures are transient.

mod error;
mod factory;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export factory functions
pub use factory::create_gateway;

// Re-export core trait only (internal traits are not exported)
pub use traits::ZoneGateway;

// Re-export types
pub use types::{ApiToken, RedirectRule, Zone, ZoneSetting, ZoneStatus};

// Re-export utils module
pub use utils::log_sanitizer;

// Re-export concrete gateway
pub use providers::CloudflareGateway;

// Re-export domain name helpers
pub use providers::common::{normalize_domain_name, same_domain};
