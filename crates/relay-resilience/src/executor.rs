//! Retry/fallback executor.
//!
//! Each attempt walks the ordered candidate variant list; the per-attempt
//! error tag decides what happens next. Unsupported variants are skipped
//! within the same attempt without consuming backoff. Quota errors rotate
//! to an alternate credential when one exists, marking the current one
//! unhealthy only when it is the last healthy credential. Sleeps honor the
//! provider's retry hint (capped) before falling back to exponential
//! backoff with linear jitter.

use crate::credentials::{CredentialPool, PoolEntry};
use rand::Rng;
use relay_core::{
    AttemptError, Completion, CompletionBackend, CompletionRequest, RelayError, RelayResult,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry/fallback configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of attempts per call
    pub max_attempts: u32,
    /// Ordered candidate call variants, cheapest first
    pub variants: Vec<String>,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Cap on computed backoff delay
    pub max_delay: Duration,
    /// Per-attempt linear jitter factor
    pub jitter_factor: Duration,
    /// Cap applied to provider-supplied retry hints
    pub hint_cap: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            variants: vec![
                "swift-1-mini".to_string(),
                "swift-1".to_string(),
                "swift-1-large".to_string(),
            ],
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter_factor: Duration::from_millis(250),
            hint_cap: Duration::from_secs(60),
        }
    }
}

/// Outcome of one pass over the candidate variants
enum VariantOutcome {
    /// A variant served the request
    Served(Completion),
    /// Quota/exhaustion error; rotate and back off
    Quota {
        detail: String,
        hint: Option<Duration>,
    },
    /// Transient provider error; back off
    Transient { detail: String },
    /// Every variant declined the request shape
    AllUnsupported,
    /// Non-retryable provider error
    Fatal { detail: String },
}

/// Executes prepared requests with retry, variant fallback, and credential
/// rotation
pub struct RetryExecutor {
    config: ExecutorConfig,
    backend: Arc<dyn CompletionBackend>,
    pool: Arc<CredentialPool>,
}

impl RetryExecutor {
    /// Create a new executor
    #[must_use]
    pub fn new(
        config: ExecutorConfig,
        backend: Arc<dyn CompletionBackend>,
        pool: Arc<CredentialPool>,
    ) -> Self {
        Self {
            config,
            backend,
            pool,
        }
    }

    /// Execute a request across attempts, variants, and credentials
    ///
    /// # Errors
    /// Returns `CONFIG_ERROR` when no credentials are configured and
    /// `PROVIDER_EXHAUSTED` when retries run out or the provider fails
    /// terminally
    pub async fn execute(&self, request: &CompletionRequest) -> RelayResult<Completion> {
        let mut last_detail = String::from("no attempts made");

        for attempt in 0..self.config.max_attempts {
            let Some(entry) = self.pool.acquire() else {
                return Err(RelayError::configuration("no credentials configured"));
            };

            match self.try_variants(request, &entry).await {
                VariantOutcome::Served(completion) => return Ok(completion),
                VariantOutcome::Fatal { detail } => {
                    return Err(RelayError::provider_exhausted(attempt + 1, detail));
                }
                VariantOutcome::AllUnsupported => {
                    return Err(RelayError::provider_exhausted(
                        attempt + 1,
                        "no candidate variant accepted the request",
                    ));
                }
                VariantOutcome::Quota { detail, hint } => {
                    warn!(
                        request_id = %request.id,
                        attempt,
                        credential = entry.index(),
                        "Provider quota error"
                    );
                    last_detail = detail;

                    if self.pool.healthy_alternates(&entry) == 0 {
                        self.pool.mark_unhealthy(&entry);
                    } else {
                        debug!(
                            credential = entry.index(),
                            "Alternate credential available, rotating"
                        );
                    }

                    if attempt + 1 < self.config.max_attempts {
                        let delay = hint
                            .map(|h| h.min(self.config.hint_cap))
                            .unwrap_or_else(|| self.backoff_delay(attempt));
                        debug!(delay_ms = delay.as_millis(), "Backing off before retry");
                        tokio::time::sleep(delay).await;
                    }
                }
                VariantOutcome::Transient { detail } => {
                    debug!(request_id = %request.id, attempt, "Transient provider error");
                    last_detail = detail;

                    if attempt + 1 < self.config.max_attempts {
                        let delay = self.backoff_delay(attempt);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(RelayError::provider_exhausted(
            self.config.max_attempts,
            last_detail,
        ))
    }

    /// Walk the candidate variants once with a fixed credential
    async fn try_variants(
        &self,
        request: &CompletionRequest,
        entry: &Arc<PoolEntry>,
    ) -> VariantOutcome {
        for variant in &self.config.variants {
            match self
                .backend
                .complete(variant, request, entry.credential())
                .await
            {
                Ok(completion) => return VariantOutcome::Served(completion),
                Err(AttemptError::UnsupportedVariant { variant }) => {
                    debug!(variant = %variant, "Variant unsupported, trying next");
                }
                Err(AttemptError::Exhausted {
                    detail,
                    retry_after,
                }) => {
                    return VariantOutcome::Quota {
                        detail,
                        hint: retry_after,
                    };
                }
                Err(AttemptError::Transient { detail }) => {
                    return VariantOutcome::Transient { detail };
                }
                Err(AttemptError::Fatal { detail }) => {
                    return VariantOutcome::Fatal { detail };
                }
            }
        }
        VariantOutcome::AllUnsupported
    }

    /// `base * 2^attempt` capped at `max_delay`, plus linear jitter
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .config
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.config.max_delay);

        let jitter_cap = self.config.jitter_factor.as_millis() as u64 * u64::from(attempt);
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_cap)
        };

        exponential + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relay_core::{Credential, RequestKind, TokenUsage};
    use std::collections::VecDeque;
    use std::time::Instant;

    /// Backend that replays a scripted sequence of attempt outcomes and
    /// records every call it receives.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<(), AttemptError>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<(), AttemptError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            variant: &str,
            request: &CompletionRequest,
            credential: &Credential,
        ) -> Result<Completion, AttemptError> {
            self.calls
                .lock()
                .push((variant.to_string(), credential.expose_secret().to_string()));

            match self.script.lock().pop_front() {
                Some(Ok(())) | None => Ok(Completion::builder()
                    .request_id(&request.id)
                    .text("ok")
                    .variant(variant)
                    .usage(TokenUsage::new(1, 1))
                    .build()),
                Some(Err(err)) => Err(err),
            }
        }

        async fn probe(&self, _credential: &Credential) -> bool {
            true
        }
    }

    fn make_request() -> CompletionRequest {
        CompletionRequest::builder()
            .kind(RequestKind::Completion)
            .content("hello")
            .build()
            .unwrap()
    }

    fn make_pool(n: usize, backend: Arc<ScriptedBackend>) -> Arc<CredentialPool> {
        let credentials = (0..n)
            .map(|i| Credential::new(format!("sk-{i}")).unwrap())
            .collect();
        Arc::new(CredentialPool::new(
            credentials,
            Duration::from_secs(600),
            backend,
        ))
    }

    fn fast_config(variants: &[&str], max_attempts: u32) -> ExecutorConfig {
        ExecutorConfig {
            max_attempts,
            variants: variants.iter().map(|v| (*v).to_string()).collect(),
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            jitter_factor: Duration::from_millis(1),
            hint_cap: Duration::from_millis(40),
        }
    }

    #[tokio::test]
    async fn test_first_variant_serves() {
        let backend = ScriptedBackend::new(vec![Ok(())]);
        let pool = make_pool(1, Arc::clone(&backend));
        let executor = RetryExecutor::new(fast_config(&["mini", "large"], 5), backend.clone(), pool);

        let completion = executor.execute(&make_request()).await.expect("served");
        assert_eq!(completion.variant, "mini");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_variant_skipped_without_backoff() {
        let backend = ScriptedBackend::new(vec![Err(AttemptError::unsupported("mini")), Ok(())]);
        let pool = make_pool(1, Arc::clone(&backend));
        let mut config = fast_config(&["mini", "large"], 5);
        config.base_delay = Duration::from_secs(2);
        let executor = RetryExecutor::new(config, backend.clone(), pool);

        let start = Instant::now();
        let completion = executor.execute(&make_request()).await.expect("served");
        assert_eq!(completion.variant, "large");
        assert_eq!(backend.calls().len(), 2);
        assert!(
            start.elapsed() < Duration::from_millis(500),
            "variant skip must not consume backoff"
        );
    }

    #[tokio::test]
    async fn test_transient_error_retried_from_first_variant() {
        let backend = ScriptedBackend::new(vec![Err(AttemptError::transient("503")), Ok(())]);
        let pool = make_pool(1, Arc::clone(&backend));
        let executor = RetryExecutor::new(fast_config(&["mini", "large"], 5), backend.clone(), pool);

        let completion = executor.execute(&make_request()).await.expect("served");
        assert_eq!(completion.variant, "mini");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "mini");
        assert_eq!(calls[1].0, "mini");
    }

    #[tokio::test]
    async fn test_quota_rotates_to_alternate_credential() {
        let backend = ScriptedBackend::new(vec![Err(AttemptError::exhausted("quota", None)), Ok(())]);
        let pool = make_pool(2, Arc::clone(&backend));
        let executor =
            RetryExecutor::new(fast_config(&["mini"], 5), backend.clone(), Arc::clone(&pool));

        executor.execute(&make_request()).await.expect("served");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].1, calls[1].1, "second attempt must use the alternate credential");
        assert_eq!(pool.healthy_count(), 2, "no marking while an alternate exists");
    }

    #[tokio::test]
    async fn test_quota_marks_last_credential_unhealthy() {
        let backend = ScriptedBackend::new(vec![Err(AttemptError::exhausted("quota", None)), Ok(())]);
        let pool = make_pool(1, Arc::clone(&backend));
        let executor =
            RetryExecutor::new(fast_config(&["mini"], 5), backend.clone(), Arc::clone(&pool));

        executor.execute(&make_request()).await.expect("served");
        assert_eq!(pool.healthy_count(), 0, "sole credential marked unhealthy");
    }

    #[tokio::test]
    async fn test_retry_hint_is_honored_and_capped() {
        let backend = ScriptedBackend::new(vec![
            Err(AttemptError::exhausted("quota", Some(Duration::from_secs(30)))),
            Ok(()),
        ]);
        let pool = make_pool(2, Arc::clone(&backend));
        let executor = RetryExecutor::new(fast_config(&["mini"], 5), backend.clone(), pool);

        let start = Instant::now();
        executor.execute(&make_request()).await.expect("served");
        let elapsed = start.elapsed();

        // hint_cap is 40ms: the 30s hint must be capped, but still observed
        assert!(elapsed >= Duration::from_millis(35));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_fatal_error_is_terminal() {
        let backend = ScriptedBackend::new(vec![Err(AttemptError::fatal("bad request shape"))]);
        let pool = make_pool(1, Arc::clone(&backend));
        let executor = RetryExecutor::new(fast_config(&["mini", "large"], 5), backend.clone(), pool);

        let err = executor.execute(&make_request()).await.expect_err("fatal");
        assert_eq!(err.code(), "PROVIDER_EXHAUSTED");
        assert_eq!(backend.calls().len(), 1, "no retry after a fatal error");
    }

    #[tokio::test]
    async fn test_all_variants_unsupported_is_terminal() {
        let backend = ScriptedBackend::new(vec![
            Err(AttemptError::unsupported("mini")),
            Err(AttemptError::unsupported("large")),
        ]);
        let pool = make_pool(1, Arc::clone(&backend));
        let executor = RetryExecutor::new(fast_config(&["mini", "large"], 5), backend.clone(), pool);

        let err = executor.execute(&make_request()).await.expect_err("terminal");
        assert_eq!(err.code(), "PROVIDER_EXHAUSTED");
        assert_eq!(backend.calls().len(), 2, "one pass over the variants, no retries");
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let backend = ScriptedBackend::new(vec![
            Err(AttemptError::transient("503")),
            Err(AttemptError::transient("503")),
        ]);
        let pool = make_pool(1, Arc::clone(&backend));
        let executor = RetryExecutor::new(fast_config(&["mini"], 2), backend.clone(), pool);

        let err = executor.execute(&make_request()).await.expect_err("exhausted");
        match err {
            RelayError::ProviderExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected ProviderExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_pool_is_config_error() {
        let backend = ScriptedBackend::new(vec![]);
        let pool = Arc::new(CredentialPool::new(
            Vec::new(),
            Duration::from_secs(90),
            backend.clone() as Arc<dyn CompletionBackend>,
        ));
        let executor = RetryExecutor::new(fast_config(&["mini"], 5), backend.clone(), pool);

        let err = executor.execute(&make_request()).await.expect_err("config");
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(backend.calls().is_empty(), "no provider call attempted");
    }

    #[test]
    fn test_backoff_growth_and_cap() {
        let backend = ScriptedBackend::new(vec![]);
        let pool = make_pool_sync(backend.clone());
        let executor = RetryExecutor::new(
            ExecutorConfig {
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_millis(400),
                jitter_factor: Duration::ZERO,
                ..Default::default()
            },
            backend,
            pool,
        );

        assert_eq!(executor.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(executor.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(executor.backoff_delay(2), Duration::from_millis(400));
        // capped
        assert_eq!(executor.backoff_delay(5), Duration::from_millis(400));
    }

    fn make_pool_sync(backend: Arc<ScriptedBackend>) -> Arc<CredentialPool> {
        Arc::new(CredentialPool::new(
            vec![Credential::new("sk-0").unwrap()],
            Duration::from_secs(600),
            backend,
        ))
    }
}
