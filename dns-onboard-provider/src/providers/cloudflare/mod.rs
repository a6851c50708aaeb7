//! Cloudflare zone gateway

mod error;
mod gateway;
mod http;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::providers::common::create_http_client;
use crate::types::ApiToken;

pub(crate) use types::{
    CloudflareRedirectRule, CloudflareResponse, CloudflareZone, RedirectDestination,
    RedirectSource, SettingBody,
};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare Zones API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_ZONES: u32 = 50;
/// 重定向规则列表单页记录数
pub(crate) const MAX_PAGE_SIZE_RULES: u32 = 50;

/// Cloudflare zone gateway bound to one API token.
pub struct CloudflareGateway {
    pub(crate) client: Client,
    pub(crate) api_token: ApiToken,
    pub(crate) api_base: String,
}

impl CloudflareGateway {
    pub fn new(api_token: ApiToken) -> Result<Self> {
        Ok(Self {
            client: create_http_client("cloudflare")?,
            api_token,
            api_base: CF_API_BASE.to_string(),
        })
    }

    /// Point the gateway at a different API root (staging, a local fake).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}
