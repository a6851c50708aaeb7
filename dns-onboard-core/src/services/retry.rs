//! 步骤级重试

use std::future::Future;

use dns_onboard_provider::Result as ProviderResult;

use crate::types::RetryPolicy;

/// 按策略执行 `op`，返回最终结果和实际尝试次数
///
/// 只有 [`is_retryable`](dns_onboard_provider::ProviderError::is_retryable) 的错误会重试。
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> (ProviderResult<T>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return (Ok(value), attempt + 1),
            Err(e) if policy.should_retry(&e, attempt) => {
                let delay = policy.delay_for(&e, attempt);
                log::warn!(
                    "[{label}] attempt {}/{} failed, retrying in {:.1}s: {e}",
                    attempt + 1,
                    policy.max_retries + 1,
                    delay.as_secs_f32(),
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return (Err(e), attempt + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_onboard_provider::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(max_retries)
            .with_base_delay(Duration::ZERO)
    }

    fn network_error() -> ProviderError {
        ProviderError::NetworkError {
            provider: "cloudflare".to_string(),
            detail: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn succeeds_first_time() {
        let (result, attempts) = run_with_retry(&fast_policy(2), "op", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = run_with_retry(&fast_policy(2), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(network_error()) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = run_with_retry(&fast_policy(2), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(network_error()) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::NetworkError { .. })));
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = run_with_retry(&fast_policy(5), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(ProviderError::InvalidCredentials {
                    provider: "cloudflare".to_string(),
                    raw_message: None,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::InvalidCredentials { .. })));
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
