//! Short-TTL response caching keyed by canonical request fingerprints.
//!
//! The fingerprint covers only the answer-relevant subset of a request:
//! the kind, the free-text content, the grounding flag, and the attachment
//! digest. Caller and tenant scopes are excluded by construction, so two
//! tenants asking the same question share one entry. Expiry is lazy; there
//! is no background sweep.

use relay_core::{Completion, CompletionRequest, RequestKind};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Time-to-live for cached completions
    pub ttl: Duration,
    /// Maximum number of entries before eviction
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(120),
            max_entries: 1024,
        }
    }
}

/// Canonical fingerprint of the answer-relevant request subset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: RequestKind,
    content_hash: u64,
    grounded: bool,
    attachment_digest: Option<String>,
}

impl Fingerprint {
    /// Derive the fingerprint from a request
    #[must_use]
    pub fn from_request(request: &CompletionRequest) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        request.payload.content.hash(&mut hasher);

        Self {
            kind: request.kind,
            content_hash: hasher.finish(),
            grounded: request.payload.grounded,
            attachment_digest: request.payload.attachment_digest.clone(),
        }
    }
}

/// A cached completion with its absolute expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    completion: Completion,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(completion: Completion, ttl: Duration) -> Self {
        Self {
            completion,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Current number of entries
    pub entries: usize,
    /// Number of evictions
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

/// Response cache for relayed completions
pub struct ResponseCache {
    config: CacheConfig,
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    stats: RwLock<CacheStats>,
}

impl ResponseCache {
    /// Create a new response cache
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Create a disabled cache (every lookup misses, writes are dropped)
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(CacheConfig {
            enabled: false,
            ..Default::default()
        })
    }

    /// Check if caching is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Look up a cached completion for this request
    pub async fn get(&self, request: &CompletionRequest) -> Option<Completion> {
        if !self.config.enabled {
            return None;
        }

        let key = Fingerprint::from_request(request);

        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        match entries.get(&key) {
            Some(entry) if !entry.is_expired() => {
                stats.hits += 1;
                debug!(kind = %request.kind, "Cache hit");
                Some(entry.completion.clone())
            }
            Some(_) => {
                entries.remove(&key);
                stats.misses += 1;
                stats.entries = entries.len();
                debug!(kind = %request.kind, "Cache miss (expired)");
                None
            }
            None => {
                stats.misses += 1;
                debug!(kind = %request.kind, "Cache miss");
                None
            }
        }
    }

    /// Store a successful completion with the configured TTL
    pub async fn put(&self, request: &CompletionRequest, completion: Completion) {
        self.put_with_ttl(request, completion, self.config.ttl).await;
    }

    /// Store a successful completion with a custom TTL
    pub async fn put_with_ttl(
        &self,
        request: &CompletionRequest,
        completion: Completion,
        ttl: Duration,
    ) {
        if !self.config.enabled {
            return;
        }

        let key = Fingerprint::from_request(request);

        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        if entries.len() >= self.config.max_entries {
            Self::evict(&mut entries, &mut stats, self.config.max_entries);
        }

        entries.insert(key, CacheEntry::new(completion, ttl));
        stats.entries = entries.len();
    }

    /// Evict expired entries, then the soonest-to-expire, until below cap
    fn evict(
        entries: &mut HashMap<Fingerprint, CacheEntry>,
        stats: &mut CacheStats,
        max_entries: usize,
    ) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());

        if entries.len() >= max_entries {
            let to_remove = entries.len() - max_entries + 1;
            let mut by_expiry: Vec<(Fingerprint, Instant)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.expires_at))
                .collect();
            by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

            for (key, _) in by_expiry.into_iter().take(to_remove) {
                entries.remove(&key);
            }
        }

        let removed = before - entries.len();
        stats.evictions += removed as u64;

        if removed > 0 {
            info!(removed, "Cache eviction completed");
        }
    }

    /// Remove expired entries
    pub async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();

        stats.entries = entries.len();
        stats.evictions += removed as u64;

        if removed > 0 {
            debug!(removed, "Expired cache entries removed");
        }
    }

    /// Clear all cache entries
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;
        entries.clear();
        stats.entries = 0;
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{RequestKind, TokenUsage};

    fn make_request(content: &str) -> CompletionRequest {
        CompletionRequest::builder()
            .kind(RequestKind::Completion)
            .content(content)
            .build()
            .expect("valid request")
    }

    fn make_completion(text: &str) -> Completion {
        Completion::builder()
            .request_id("req-1")
            .text(text)
            .variant("swift-1-mini")
            .usage(TokenUsage::new(10, 5))
            .build()
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = ResponseCache::with_defaults();
        let request = make_request("What is the total?");

        cache.put(&request, make_completion("42")).await;

        let cached = cache.get(&request).await.expect("hit");
        assert_eq!(cached.text, "42");
    }

    #[tokio::test]
    async fn test_miss_on_different_content() {
        let cache = ResponseCache::with_defaults();
        cache.put(&make_request("Hello"), make_completion("a")).await;
        assert!(cache.get(&make_request("Goodbye")).await.is_none());
    }

    #[tokio::test]
    async fn test_fingerprint_excludes_request_id() {
        // two requests with identical payloads but distinct generated ids
        // must share one cache entry
        let cache = ResponseCache::with_defaults();
        let first = make_request("Same question");
        let second = make_request("Same question");
        assert_ne!(first.id, second.id);

        cache.put(&first, make_completion("answer")).await;
        assert!(cache.get(&second).await.is_some());
    }

    #[tokio::test]
    async fn test_grounding_flag_distinguishes() {
        let cache = ResponseCache::with_defaults();
        let grounded = CompletionRequest::builder()
            .content("Summarize")
            .grounded(true)
            .build()
            .unwrap();
        let ungrounded = CompletionRequest::builder()
            .content("Summarize")
            .grounded(false)
            .build()
            .unwrap();

        cache.put(&grounded, make_completion("a")).await;
        assert!(cache.get(&ungrounded).await.is_none());
    }

    #[tokio::test]
    async fn test_attachment_digest_distinguishes() {
        let cache = ResponseCache::with_defaults();
        let with_doc = CompletionRequest::builder()
            .content("Extract totals")
            .attachment_digest("doc-1")
            .build()
            .unwrap();
        let other_doc = CompletionRequest::builder()
            .content("Extract totals")
            .attachment_digest("doc-2")
            .build()
            .unwrap();

        cache.put(&with_doc, make_completion("a")).await;
        assert!(cache.get(&other_doc).await.is_none());
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = ResponseCache::new(CacheConfig {
            enabled: true,
            ttl: Duration::from_millis(40),
            max_entries: 16,
        });
        let request = make_request("short lived");

        cache.put(&request, make_completion("a")).await;
        assert!(cache.get(&request).await.is_some());

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(cache.get(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = ResponseCache::disabled();
        let request = make_request("anything");
        cache.put(&request, make_completion("a")).await;
        assert!(cache.get(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_eviction_at_capacity() {
        let cache = ResponseCache::new(CacheConfig {
            enabled: true,
            ttl: Duration::from_secs(60),
            max_entries: 2,
        });

        cache.put(&make_request("one"), make_completion("1")).await;
        cache.put(&make_request("two"), make_completion("2")).await;
        cache.put(&make_request("three"), make_completion("3")).await;

        let stats = cache.stats().await;
        assert!(stats.entries <= 2);
        assert!(stats.evictions >= 1);
        assert!(cache.get(&make_request("three")).await.is_some());
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = ResponseCache::with_defaults();
        let request = make_request("stats");

        cache.get(&request).await;
        cache.put(&request, make_completion("a")).await;
        cache.get(&request).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 50.0).abs() < 0.1);
    }
}
