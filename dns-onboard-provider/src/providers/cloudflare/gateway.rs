//! Cloudflare `ZoneGateway` trait 实现

use std::future::Future;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{ProviderError, Result};
use crate::providers::common::{normalize_domain_name, same_domain};
use crate::traits::{ErrorContext, ProviderErrorMapper, ZoneGateway};
use crate::types::{RedirectRule, Zone, ZoneSetting, ZoneStatus};

use super::{
    CloudflareGateway, CloudflareRedirectRule, CloudflareZone, MAX_PAGE_SIZE_RULES,
    MAX_PAGE_SIZE_ZONES, RedirectDestination, RedirectSource, SettingBody,
};

/// 并发拉取列表分页时的最大并发数
const MAX_CONCURRENT_PAGES: usize = 4;

/// 在第一页之后按顺序拉取第 2..=`page_count` 页并合并
async fn collect_pages<T, F, Fut>(first: Vec<T>, page_count: u32, fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, u32)>>,
{
    let mut items = first;
    if page_count > 1 {
        let rest: Vec<Vec<T>> = stream::iter(2..=page_count)
            .map(fetch)
            .buffered(MAX_CONCURRENT_PAGES)
            .map_ok(|(page_items, _)| page_items)
            .try_collect()
            .await?;
        items.extend(rest.into_iter().flatten());
    }
    Ok(items)
}

impl CloudflareGateway {
    /// 将 Cloudflare zone 转换为 `Zone`
    pub(crate) fn zone_from_cf(zone: CloudflareZone) -> Zone {
        Zone {
            status: ZoneStatus::parse(&zone.status),
            id: zone.id,
            name: zone.name,
            name_servers: zone.name_servers,
        }
    }

    /// 从 `?name=` 过滤结果中挑出名称完全一致的 zone
    ///
    /// 不信任 API 过滤的精确性：名称与 `domain` 不同的结果（前缀、后缀、其他 TLD）一律不返回。
    pub(crate) fn select_zone(domain: &str, zones: Vec<CloudflareZone>) -> Option<CloudflareZone> {
        zones.into_iter().find(|z| same_domain(&z.name, domain))
    }

    pub(crate) fn rule_from_cf(rule: CloudflareRedirectRule) -> RedirectRule {
        RedirectRule {
            id: rule.id,
            name: rule.name,
            source_pattern: rule.source.pattern,
            status_code: rule.source.status_code,
            destination_url: rule.destination.url,
        }
    }

    pub(crate) fn rule_to_cf(rule: &RedirectRule) -> CloudflareRedirectRule {
        CloudflareRedirectRule {
            id: None,
            name: rule.name.clone(),
            source: RedirectSource {
                pattern: rule.source_pattern.clone(),
                status_code: rule.status_code,
            },
            destination: RedirectDestination {
                url: rule.destination_url.clone(),
            },
        }
    }

    async fn zone_page(&self, page: u32) -> Result<(Vec<CloudflareZone>, u32)> {
        self.get_page(
            &format!("/zones?page={page}&per_page={MAX_PAGE_SIZE_ZONES}"),
            ErrorContext::default(),
        )
        .await
    }

    async fn rule_page(&self, zone: &Zone, page: u32) -> Result<(Vec<CloudflareRedirectRule>, u32)> {
        self.get_page(
            &format!(
                "/zones/{}/rules/redirect?page={page}&per_page={MAX_PAGE_SIZE_RULES}",
                zone.id
            ),
            ErrorContext::zone(zone),
        )
        .await
    }
}

#[async_trait]
impl ZoneGateway for CloudflareGateway {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn resolve_zone(&self, domain: &str) -> Result<Zone> {
        let name = normalize_domain_name(domain);
        let ctx = ErrorContext {
            domain: Some(name.clone()),
            setting: None,
        };

        let (zones, _) = self
            .get_page::<CloudflareZone>(
                &format!("/zones?name={}", urlencoding::encode(&name)),
                ctx,
            )
            .await?;

        Self::select_zone(&name, zones)
            .map(Self::zone_from_cf)
            .ok_or_else(|| ProviderError::ZoneNotFound {
                provider: self.provider_name().to_string(),
                domain: name,
                raw_message: None,
            })
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let (first, page_count) = self.zone_page(1).await?;
        let zones = collect_pages(first, page_count, |page| self.zone_page(page)).await?;
        Ok(zones.into_iter().map(|z| z.name).collect())
    }

    async fn delete_zone(&self, zone: &Zone) -> Result<()> {
        self.delete(&format!("/zones/{}", zone.id), ErrorContext::zone(zone))
            .await
    }

    async fn apply_setting(&self, zone: &Zone, setting: ZoneSetting, value: &str) -> Result<()> {
        let ctx = ErrorContext {
            setting: Some(setting.as_str().to_string()),
            ..ErrorContext::zone(zone)
        };
        self.patch(
            &format!("/zones/{}/settings/{}", zone.id, setting.as_str()),
            &SettingBody { value },
            ctx,
        )
        .await
    }

    async fn list_redirect_rules(&self, zone: &Zone) -> Result<Vec<RedirectRule>> {
        let (first, page_count) = self.rule_page(zone, 1).await?;
        let rules = collect_pages(first, page_count, |page| self.rule_page(zone, page)).await?;
        Ok(rules.into_iter().map(Self::rule_from_cf).collect())
    }

    async fn create_redirect_rule(&self, zone: &Zone, rule: &RedirectRule) -> Result<RedirectRule> {
        let created: CloudflareRedirectRule = self
            .post(
                &format!("/zones/{}/rules/redirect", zone.id),
                &Self::rule_to_cf(rule),
                ErrorContext::zone(zone),
            )
            .await?;
        Ok(Self::rule_from_cf(created))
    }

    async fn update_redirect_rule(
        &self,
        zone: &Zone,
        rule_id: &str,
        rule: &RedirectRule,
    ) -> Result<RedirectRule> {
        let updated: CloudflareRedirectRule = self
            .put(
                &format!("/zones/{}/rules/redirect/{rule_id}", zone.id),
                &Self::rule_to_cf(rule),
                ErrorContext::zone(zone),
            )
            .await?;
        Ok(Self::rule_from_cf(updated))
    }
}
