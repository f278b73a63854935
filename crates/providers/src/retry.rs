//! Retry decorator with exponential backoff.
//!
//! Wraps any provider. A failed attempt `i` waits `base_delay * 2^i` before
//! the next one; when every attempt fails, the caller gets a single
//! `RetriesExhausted` error wrapping the last failure.

use async_trait::async_trait;
use std::time::Duration;
use tinyagent_core::error::ProviderError;
use tinyagent_core::message::Message;
use tinyagent_core::provider::{CompletionResponse, Provider, ToolDefinition};
use tracing::{info, warn};

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_retries` is the total number of attempts; 0 is treated as 1.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait after the zero-based `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// A provider that retries its inner provider on failure.
pub struct RetryProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: Provider> RetryProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: Provider> Provider for RetryProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let attempts = self.policy.max_retries;
        let mut attempt = 0;

        loop {
            match self.inner.complete(messages, tools).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(
                            provider = %self.inner.name(),
                            attempt = attempt + 1,
                            "Provider call succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if attempt + 1 >= attempts => {
                    warn!(
                        provider = %self.inner.name(),
                        attempts,
                        error = %e,
                        "Provider call failed, retries exhausted"
                    );
                    return Err(ProviderError::RetriesExhausted {
                        attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        provider = %self.inner.name(),
                        attempt = attempt + 1,
                        total = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Provider call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tinyagent_core::message::ContentBlock;
    use tokio::time::Instant;

    /// Fails a fixed number of times, then answers "ok". Records when each
    /// call happened.
    struct FlakyProvider {
        failures: u32,
        calls: Mutex<Vec<Instant>>,
    }

    impl FlakyProvider {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Instant::now());
            let n = calls.len() as u32;
            if n <= self.failures {
                Err(ProviderError::Network(format!("connection reset #{n}")))
            } else {
                Ok(CompletionResponse::new(vec![ContentBlock::text("ok")]))
            }
        }
    }

    fn gaps(times: &[Instant]) -> Vec<Duration> {
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures_with_growing_backoff() {
        let provider = RetryProvider::new(FlakyProvider::new(2), RetryPolicy::default());

        let response = provider.complete(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(response.content, vec![ContentBlock::text("ok")]);

        let times = provider.inner().call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(
            gaps(&times),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_wraps_last_error() {
        let provider = RetryProvider::new(FlakyProvider::new(u32::MAX), RetryPolicy::default());
        let started = Instant::now();

        let err = provider.complete(&[Message::user("hi")], &[]).await.unwrap_err();
        match &err {
            ProviderError::RetriesExhausted { attempts, source } => {
                assert_eq!(*attempts, 3);
                assert!(source.to_string().contains("connection reset #3"));
            }
            other => panic!("Expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(provider.inner().call_times().len(), 3);
        // no wait after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_makes_single_call() {
        let provider = RetryProvider::new(FlakyProvider::new(0), RetryPolicy::default());
        provider.complete(&[], &[]).await.unwrap();
        assert_eq!(provider.inner().call_times().len(), 1);
        assert_eq!(provider.name(), "flaky");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_still_attempts_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_retries(), 1);

        let provider = RetryProvider::new(FlakyProvider::new(1), policy);
        let err = provider.complete(&[], &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(provider.inner().call_times().len(), 1);
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }
}
