//! Gateway factory Trait

use std::sync::Arc;

use dns_onboard_provider::{ApiToken, ZoneGateway, create_gateway};

use crate::error::CoreResult;

/// Gateway Factory Trait
///
/// Builds a [`ZoneGateway`] bound to one token snapshot. Every command gets its own
/// gateway, so a token change never affects a command that is already running.
pub trait GatewayFactory: Send + Sync {
    /// Build a gateway that authenticates every call with `token`
    ///
    /// # Arguments
    /// * `token` - Token snapshot taken when the command was accepted
    fn create(&self, token: &ApiToken) -> CoreResult<Arc<dyn ZoneGateway>>;
}

/// Cloudflare gateway factory
///
/// Default implementation, backed by [`create_gateway`].
#[derive(Debug, Clone, Default)]
pub struct CloudflareGatewayFactory {
    api_base: Option<String>,
}

impl CloudflareGatewayFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the API root (tests, proxies)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

impl GatewayFactory for CloudflareGatewayFactory {
    fn create(&self, token: &ApiToken) -> CoreResult<Arc<dyn ZoneGateway>> {
        Ok(create_gateway(token.clone(), self.api_base.as_deref())?)
    }
}
