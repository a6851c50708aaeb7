//! Cloudflare API 类型定义

use serde::{Deserialize, Serialize};

/// Cloudflare API 通用响应
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    pub result_info: Option<CloudflareResultInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareResultInfo {
    #[allow(dead_code)]
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_count: u32,
}

impl CloudflareResultInfo {
    /// Number of pages, derived from `total_count` when the API omits `total_pages`.
    pub fn page_count(&self) -> u32 {
        self.total_pages.unwrap_or_else(|| {
            if self.per_page == 0 {
                1
            } else {
                self.total_count.div_ceil(self.per_page)
            }
        })
    }
}

/// Cloudflare Zone 结构
#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

/// PATCH `/zones/{id}/settings/{name}` 请求体
#[derive(Debug, Serialize)]
pub struct SettingBody<'a> {
    pub value: &'a str,
}

/// Redirect rule as sent to and returned by `/zones/{id}/rules/redirect`
#[derive(Debug, Serialize, Deserialize)]
pub struct CloudflareRedirectRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub source: RedirectSource,
    pub destination: RedirectDestination,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedirectSource {
    pub pattern: String,
    pub status_code: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedirectDestination {
    pub url: String,
}
