//! Cloudflare HTTP 请求方法

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::{CloudflareGateway, CloudflareResponse};

impl CloudflareGateway {
    /// 发送请求并解析 Cloudflare 响应信封
    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        ctx: ErrorContext,
    ) -> Result<CloudflareResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.api_base);
        let method_name = method.to_string();

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(self.api_token.expose());

        if let Some(body) = body {
            let payload =
                serde_json::to_string(body).map_err(|e| ProviderError::SerializationError {
                    provider: self.provider_name().to_string(),
                    detail: e.to_string(),
                })?;
            log::debug!("Request Body: {payload}");
            request = request
                .header("Content-Type", "application/json")
                .body(payload);
        }

        let (status, response_text) =
            HttpUtils::execute_request(request, self.provider_name(), &method_name, &url).await?;

        self.decode_envelope(status, &response_text, ctx)
    }

    /// 解析响应信封，把 `success: false` 与非 2xx 响应映射为统一错误
    pub(crate) fn decode_envelope<T: DeserializeOwned>(
        &self,
        status: u16,
        response_text: &str,
        ctx: ErrorContext,
    ) -> Result<CloudflareResponse<T>> {
        let is_2xx = (200..300).contains(&status);

        match serde_json::from_str::<CloudflareResponse<T>>(response_text) {
            Ok(envelope) if envelope.success => Ok(envelope),
            Ok(envelope) => {
                let (code, message) = envelope.errors.first().map_or_else(
                    || (format!("HTTP {status}"), "Unknown error".to_string()),
                    |e| (e.code.to_string(), e.message.clone()),
                );
                log::error!("API 错误: {code} {message}");
                Err(self.map_error(RawApiError::with_code(code, message), ctx))
            }
            Err(e) if is_2xx => {
                log::error!("JSON 解析失败: {e}");
                log::error!("原始响应: {}", truncate_for_log(response_text));
                Err(self.parse_error(e))
            }
            Err(_) => Err(self.map_error(
                RawApiError::with_code(format!("HTTP {status}"), truncate_for_log(response_text)),
                ctx,
            )),
        }
    }

    /// 执行 GET 请求，要求响应带 `result`
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, ctx: ErrorContext) -> Result<T> {
        self.send::<T, ()>(Method::GET, path, None, ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }

    /// 执行 GET 请求（列表），返回当前页数据和总页数
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: ErrorContext,
    ) -> Result<(Vec<T>, u32)> {
        let envelope = self.send::<Vec<T>, ()>(Method::GET, path, None, ctx).await?;
        let page_count = envelope.result_info.as_ref().map_or(1, |i| i.page_count());
        Ok((envelope.result.unwrap_or_default(), page_count))
    }

    /// 执行 POST 请求
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B, ctx: ErrorContext) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send::<T, B>(Method::POST, path, Some(body), ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }

    /// 执行 PUT 请求
    pub(crate) async fn put<T, B>(&self, path: &str, body: &B, ctx: ErrorContext) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send::<T, B>(Method::PUT, path, Some(body), ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }

    /// 执行 PATCH 请求，丢弃 result
    pub(crate) async fn patch<B>(&self, path: &str, body: &B, ctx: ErrorContext) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send::<serde_json::Value, B>(Method::PATCH, path, Some(body), ctx)
            .await
            .map(|_| ())
    }

    /// 执行 DELETE 请求
    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        self.send::<serde_json::Value, ()>(Method::DELETE, path, None, ctx)
            .await
            .map(|_| ())
    }
}
