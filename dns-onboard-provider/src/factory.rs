//! Gateway factory functions.

use std::sync::Arc;

use crate::error::Result;
use crate::providers::CloudflareGateway;
use crate::traits::ZoneGateway;
use crate::types::ApiToken;

/// Creates a [`ZoneGateway`] bound to `api_token`.
///
/// The returned gateway is wrapped in `Arc<dyn ZoneGateway>` for easy sharing
/// across async tasks. `api_base` overrides the default Cloudflare API root.
///
/// # Examples
///
/// ```rust,no_run
/// use dns_onboard_provider::{create_gateway, ApiToken};
///
/// let gateway = create_gateway(ApiToken::new("your-token"), None).unwrap();
/// ```
pub fn create_gateway(api_token: ApiToken, api_base: Option<&str>) -> Result<Arc<dyn ZoneGateway>> {
    let gateway = CloudflareGateway::new(api_token)?;
    Ok(match api_base {
        Some(base) => Arc::new(gateway.with_api_base(base)),
        None => Arc::new(gateway),
    })
}
