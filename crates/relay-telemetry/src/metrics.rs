//! Prometheus metrics for the relay.
//!
//! Provides metrics for:
//! - Call counts and latencies by request kind and outcome code
//! - Fast rejections by code
//! - Cache hit/miss behavior
//! - Calls currently in flight

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::error;

/// Metrics configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Histogram buckets for call latency (seconds)
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            latency_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            ],
        }
    }
}

/// Metrics registry and collectors
pub struct Metrics {
    registry: Registry,
    calls_total: CounterVec,
    rejections_total: CounterVec,
    cache_ops_total: CounterVec,
    call_latency: HistogramVec,
    inflight_calls: IntGauge,
}

impl Metrics {
    /// Create a new metrics instance
    ///
    /// # Errors
    /// Returns error if metrics cannot be registered
    pub fn new(config: &MetricsConfig) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let calls_total = CounterVec::new(
            Opts::new("relay_calls_total", "Total relayed calls by outcome"),
            &["kind", "code"],
        )?;
        registry.register(Box::new(calls_total.clone()))?;

        let rejections_total = CounterVec::new(
            Opts::new("relay_rejections_total", "Fast rejections by code"),
            &["code"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let cache_ops_total = CounterVec::new(
            Opts::new("relay_cache_ops_total", "Response cache lookups"),
            &["result"],
        )?;
        registry.register(Box::new(cache_ops_total.clone()))?;

        let call_latency = HistogramVec::new(
            HistogramOpts::new("relay_call_latency_seconds", "Call latency")
                .buckets(config.latency_buckets.clone()),
            &["kind"],
        )?;
        registry.register(Box::new(call_latency.clone()))?;

        let inflight_calls =
            IntGauge::new("relay_inflight_calls", "Outbound calls currently in flight")?;
        registry.register(Box::new(inflight_calls.clone()))?;

        Ok(Self {
            registry,
            calls_total,
            rejections_total,
            cache_ops_total,
            call_latency,
            inflight_calls,
        })
    }

    /// Create with default configuration
    ///
    /// # Panics
    /// Panics if default metric registration fails (metric names are static,
    /// so this only happens on duplicate registration within one registry)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_defaults() -> Self {
        Self::new(&MetricsConfig::default()).expect("default metrics registration")
    }

    /// Record a completed call (success or terminal failure)
    pub fn record_call(&self, kind: &str, code: &str, latency: Duration) {
        self.calls_total.with_label_values(&[kind, code]).inc();
        self.call_latency
            .with_label_values(&[kind])
            .observe(latency.as_secs_f64());
    }

    /// Record a fast rejection
    pub fn record_rejection(&self, code: &str) {
        self.rejections_total.with_label_values(&[code]).inc();
    }

    /// Record a cache hit
    pub fn record_cache_hit(&self) {
        self.cache_ops_total.with_label_values(&["hit"]).inc();
    }

    /// Record a cache miss
    pub fn record_cache_miss(&self) {
        self.cache_ops_total.with_label_values(&["miss"]).inc();
    }

    /// Set the in-flight gauge
    pub fn set_inflight(&self, count: usize) {
        self.inflight_calls.set(count as i64);
    }

    /// Render all metrics in the Prometheus text exposition format
    #[must_use]
    pub fn gather(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!(error = %e, "Failed to encode metrics");
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
