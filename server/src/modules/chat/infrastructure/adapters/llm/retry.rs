// 重试装饰器
//
// 包裹任意 LLMPort，对限流和超时做指数退避重试。
// 调度器本身不重试，是否启用由提供商配置的 max_retries 决定。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::modules::chat::ports::{CompletionRequest, CompletionResponse, LLMPort, ProviderError};

/// 退避策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    /// 第 attempt 次重试前的等待时间（attempt 从 0 开始）
    ///
    /// 提供商给出 Retry-After 时以其为准，但不超过 max_delay
    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        let delay = match retry_after_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.base_delay.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }
}

pub struct RetryingAdapter {
    inner: Arc<dyn LLMPort>,
    policy: RetryPolicy,
}

impl RetryingAdapter {
    pub fn new(inner: Arc<dyn LLMPort>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LLMPort for RetryingAdapter {
    fn provider_id(&self) -> &str {
        self.inner.provider_id()
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(request.clone()).await {
                Err(e) if e.kind.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt, e.retry_after_secs);
                    warn!(
                        "[{}] {}; retrying in {:?} ({}/{})",
                        self.inner.provider_id(),
                        e,
                        delay,
                        attempt + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{HistoryEntry, MessageRole};
    use crate::modules::chat::ports::ProviderErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 前 n 次返回指定错误，之后成功
    struct Flaky {
        failures: u32,
        kind: ProviderErrorKind,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LLMPort for Flaky {
        fn provider_id(&self) -> &str {
            "flaky"
        }

        async fn generate(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ProviderError::new(self.kind, "boom"))
            } else {
                Ok(CompletionResponse::text("ok"))
            }
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![HistoryEntry::new(MessageRole::User, "hi")], "m")
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(5);
        assert_eq!(policy.delay_for(0, None), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10, None), Duration::from_secs(8));
        assert_eq!(policy.delay_for(0, Some(3)), Duration::from_secs(3));
        assert_eq!(policy.delay_for(0, Some(60)), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let inner = Arc::new(Flaky {
            failures: 2,
            kind: ProviderErrorKind::RateLimited,
            calls: AtomicU32::new(0),
        });
        let adapter = RetryingAdapter::new(inner.clone(), fast_policy(3));

        let response = adapter.generate(request()).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = Arc::new(Flaky {
            failures: 10,
            kind: ProviderErrorKind::Timeout,
            calls: AtomicU32::new(0),
        });
        let adapter = RetryingAdapter::new(inner.clone(), fast_policy(2));

        let err = adapter.generate(request()).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_invalid_response() {
        let inner = Arc::new(Flaky {
            failures: 1,
            kind: ProviderErrorKind::InvalidResponse,
            calls: AtomicU32::new(0),
        });
        let adapter = RetryingAdapter::new(inner.clone(), fast_policy(3));

        assert!(adapter.generate(request()).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
