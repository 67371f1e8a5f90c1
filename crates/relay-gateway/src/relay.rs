//! The gateway façade.
//!
//! Per-call sequencing is fixed and must not be reordered: caller-input
//! validation → credential presence → circuit breaker → rate limits in
//! ascending specificity → cache lookup → concurrency gate → executor.
//! The gate is the most expensive check to hold, so it comes last among
//! the fast-reject checks. Breaker and credential state mutate only on
//! provider-side outcomes; caller-input and configuration errors never
//! touch shared resilience state.

use crate::stats::{BreakerStats, CredentialStats, GateStats, RelayStats};
use relay_config::RelayConfig;
use relay_core::{
    CallPayload, Completion, CompletionBackend, CompletionRequest, Credential, RelayError,
    RelayResult, RequestKind, ScopeKey,
};
use relay_resilience::{
    BreakerConfig, CacheConfig, CircuitBreaker, CredentialPool, ExecutorConfig, InflightGate,
    RateLimiter, ResponseCache, RetryExecutor,
};
use relay_telemetry::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Scope key under which the global budget is tracked
const GLOBAL_SCOPE: &str = "global";

/// The single entry point for outbound generative calls
pub struct CompletionRelay {
    config: RelayConfig,
    breaker: Arc<CircuitBreaker>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    gate: Arc<InflightGate>,
    pool: Arc<CredentialPool>,
    executor: RetryExecutor,
    metrics: Arc<Metrics>,
}

impl CompletionRelay {
    /// Create a new relay builder
    #[must_use]
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    /// Relay one call to the provider.
    ///
    /// # Errors
    /// Returns a `RelayError` whose `code()` identifies the rejection or
    /// failure: `INVALID_REQUEST`, `CONFIG_ERROR`, `CIRCUIT_OPEN`,
    /// `RATE_LIMIT` (with `retry_after`), `CONCURRENCY_LIMIT`, or
    /// `PROVIDER_EXHAUSTED`
    #[instrument(skip(self, payload), fields(kind = %kind, caller = %caller_scope, tenant = %tenant_scope))]
    pub async fn call(
        &self,
        kind: &str,
        payload: serde_json::Value,
        caller_scope: &str,
        tenant_scope: &str,
    ) -> RelayResult<Completion> {
        let started = Instant::now();
        let kind_label = kind
            .parse::<RequestKind>()
            .map_or_else(|_| "unknown".to_string(), |k| k.to_string());

        let result = self
            .dispatch(kind, payload, caller_scope, tenant_scope)
            .await;

        match &result {
            Ok(completion) => {
                self.metrics
                    .record_call(&kind_label, "OK", started.elapsed());
                info!(
                    request_id = %completion.request_id,
                    variant = %completion.variant,
                    duration_ms = started.elapsed().as_millis(),
                    "Call completed"
                );
            }
            Err(err) if err.is_rejection() => {
                self.metrics.record_rejection(err.code());
                debug!(code = err.code(), "Call rejected");
            }
            Err(err) => {
                self.metrics
                    .record_call(&kind_label, err.code(), started.elapsed());
                error!(code = err.code(), error = %err, "Call failed");
            }
        }

        result
    }

    /// Read-only snapshot of breaker, credential, cache, and gate state
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            breaker: BreakerStats {
                state: self.breaker.state().to_string(),
                failure_count: self.breaker.failure_count(),
            },
            credentials: CredentialStats {
                total: self.pool.total(),
                healthy: self.pool.healthy_count(),
            },
            cache: self.cache.stats().await.into(),
            gate: GateStats {
                capacity: self.gate.capacity(),
                available: self.gate.available(),
                in_flight: self.gate.in_flight(),
            },
        }
    }

    /// Access the metrics registry (for exposition by the host)
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    async fn dispatch(
        &self,
        kind: &str,
        payload: serde_json::Value,
        caller_scope: &str,
        tenant_scope: &str,
    ) -> RelayResult<Completion> {
        // caller-input validation first: it must not touch resilience state
        let kind: RequestKind = kind.parse()?;
        let caller = ScopeKey::new(caller_scope)?;
        let tenant = ScopeKey::new(tenant_scope)?;
        let payload: CallPayload = serde_json::from_value(payload).map_err(|e| {
            RelayError::validation(format!("malformed payload: {e}"), Some("payload".to_string()))
        })?;
        let request = CompletionRequest::new(kind, payload)?;

        // configuration error: fatal before any budget is consumed
        if self.pool.is_empty() {
            return Err(RelayError::configuration("no credentials configured"));
        }

        self.breaker.check()?;
        self.check_rate_scopes(&caller, &tenant).await?;

        if let Some(cached) = self.cache.get(&request).await {
            self.metrics.record_cache_hit();
            debug!(request_id = %request.id, "Serving cached completion");
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let Some(permit) = self.gate.try_acquire() else {
            return Err(RelayError::concurrency_limit(self.gate.capacity()));
        };
        self.metrics.set_inflight(self.gate.in_flight());

        let result = self.executor.execute(&request).await;

        if let Ok(ref completion) = result {
            self.cache.put(&request, completion.clone()).await;
        }

        // permit drop releases the slot on every path; the explicit drop
        // just keeps the gauge accurate
        drop(permit);
        self.metrics.set_inflight(self.gate.in_flight());

        match result {
            Ok(completion) => {
                self.breaker.record_success();
                Ok(completion)
            }
            Err(err) => {
                if matches!(err, RelayError::ProviderExhausted { .. }) {
                    self.breaker.record_failure();
                }
                Err(err)
            }
        }
    }

    /// Evaluate rate scopes in ascending specificity, rejecting on the
    /// first denial so a tenant-wide denial is never masked by available
    /// global budget.
    async fn check_rate_scopes(&self, caller: &ScopeKey, tenant: &ScopeKey) -> RelayResult<()> {
        let limits = &self.config.rate_limits;
        let checks = [
            (format!("caller:{caller}"), &limits.caller),
            (format!("tenant:{tenant}"), &limits.tenant),
            (GLOBAL_SCOPE.to_string(), &limits.global),
        ];

        for (scope, limit) in checks {
            let decision = self.limiter.check(&scope, limit.limit, limit.window).await;
            if !decision.allowed {
                return Err(RelayError::rate_limit(
                    scope,
                    limit.limit,
                    decision.retry_after.unwrap_or(limit.window),
                ));
            }
        }
        Ok(())
    }
}

/// Builder for `CompletionRelay`
pub struct RelayBuilder {
    config: Option<RelayConfig>,
    backend: Option<Arc<dyn CompletionBackend>>,
    metrics: Option<Metrics>,
}

impl RelayBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            backend: None,
            metrics: None,
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the provider backend
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set a custom metrics instance
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the relay, constructing every component once
    ///
    /// # Errors
    /// Returns `CONFIG_ERROR` if the backend is missing or a configured
    /// credential is malformed
    pub fn build(self) -> RelayResult<CompletionRelay> {
        let config = self.config.unwrap_or_default();
        let backend = self
            .backend
            .ok_or_else(|| RelayError::configuration("backend is required"))?;

        let credentials: Vec<Credential> = config
            .resolve_credentials()
            .into_iter()
            .map(Credential::new)
            .collect::<Result<_, _>>()
            .map_err(|e| RelayError::configuration(e.to_string()))?;

        let pool = Arc::new(CredentialPool::new(
            credentials,
            config.credential_recheck_interval,
            Arc::clone(&backend),
        ));

        let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
            failure_threshold: config.circuit_breaker.failure_threshold,
            cool_down: config.circuit_breaker.cool_down,
        }));

        let cache = Arc::new(ResponseCache::new(CacheConfig {
            enabled: config.cache.enabled,
            ttl: config.cache.ttl,
            max_entries: config.cache.max_entries,
        }));

        let gate = Arc::new(InflightGate::new(config.max_concurrency));

        let executor = RetryExecutor::new(
            ExecutorConfig {
                max_attempts: config.retry.max_attempts,
                variants: config.variants.clone(),
                base_delay: config.retry.base_delay,
                max_delay: config.retry.max_delay,
                jitter_factor: config.retry.jitter_factor,
                hint_cap: config.retry.hint_cap,
            },
            backend,
            Arc::clone(&pool),
        );

        info!(
            credentials = pool.total(),
            variants = config.variants.len(),
            max_concurrency = config.max_concurrency,
            "Completion relay constructed"
        );

        Ok(CompletionRelay {
            config,
            breaker,
            limiter: Arc::new(RateLimiter::new()),
            cache,
            gate,
            pool,
            executor,
            metrics: Arc::new(self.metrics.unwrap_or_else(Metrics::with_defaults)),
        })
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
