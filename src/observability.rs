//! Observability and expiry policy for cache operations.
//!
//! Two concerns live here:
//!
//! - **Metrics (`CacheMetrics`)**: hits, misses, writes, deletes, bulk invalidations, errors
//! - **TTL Policies (`TtlPolicy`)**: how long a resource's entries live in the backend
//!
//! # Metrics
//!
//! Implement the `CacheMetrics` trait to forward cache statistics to your monitoring system:
//!
//! ```ignore
//! use resource_cache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("cache_hits").inc();
//!     }
//!     // ... implement other methods
//! }
//!
//! // let cache = CacheService::new(backend)
//! //     .with_metrics(Arc::new(PrometheusMetrics));
//! ```
//!
//! The default `NoOpMetrics` records nothing; the trait's provided methods log via the
//! `log` crate for implementations that only override some hooks.
//!
//! # TTL Policies
//!
//! The policy is consulted once, when a builder is created for a resource:
//!
//! ```
//! use resource_cache::observability::TtlPolicy;
//! use std::time::Duration;
//!
//! // Fixed TTL for all resources (5 minutes)
//! let _policy = TtlPolicy::Fixed(Duration::from_secs(300));
//!
//! // Different TTL per resource
//! let _policy = TtlPolicy::PerResource(|resource| {
//!     match resource {
//!         "user" => Duration::from_secs(3600),
//!         "session" => Duration::from_secs(1800),
//!         _ => Duration::from_secs(600),
//!     }
//! });
//! ```
//!
//! | Policy | Use Case |
//! |--------|----------|
//! | `Default` | Entries live until deleted or invalidated |
//! | `Fixed` | Uniform cache duration |
//! | `PerResource` | Users cache 1h, sessions 30m |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record a bulk invalidation of a resource.
    fn record_invalidate(&self, resource: &str, keys: usize, duration: Duration) {
        debug!(
            "Cache INVALIDATE: {} ({} keys) took {:?}",
            resource, keys, duration
        );
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_invalidate(&self, _resource: &str, _keys: usize, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// TTL (Time-to-Live) policy for cache entries.
#[derive(Clone, Debug, Default)]
pub enum TtlPolicy {
    /// No TTL (entries live forever) unless a builder overrides it
    #[default]
    Default,

    /// Fixed duration for all resources
    Fixed(Duration),

    /// Custom per-resource policy
    PerResource(fn(&str) -> Duration),
}

impl TtlPolicy {
    /// Get TTL for a resource.
    pub fn get_ttl(&self, resource: &str) -> Option<Duration> {
        match self {
            TtlPolicy::Default => None,
            TtlPolicy::Fixed(d) => Some(*d),
            TtlPolicy::PerResource(f) => Some(f(resource)),
        }
    }
}
