//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Automatically handles TTL expiration on access.

use super::CacheBackend;
use crate::context::Context;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        // Zero or unrepresentable TTL means no expiry, like the Redis backend
        let expires_at = ttl
            .filter(|d| !d.is_zero())
            .and_then(|d| Instant::now().checked_add(d));
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Plain values and sets live in separate DashMaps, so a key holds either
/// a value or a set. Clones share the same storage and the same open/closed state.
///
/// # Example
///
/// ```no_run
/// use resource_cache::backend::{InMemoryBackend, CacheBackend};
/// use resource_cache::context::Context;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///     let ctx = Context::background();
///
///     backend.set(&ctx, "user:id:1", b"value".to_vec(), None).await?;
///     backend.add_to_set(&ctx, "user:index", "user:id:1").await?;
///
///     let value = backend.get(&ctx, "user:id:1").await?;
///     assert!(value.is_some());
///
///     backend
///         .set(&ctx, "user:all", b"expires".to_vec(), Some(Duration::from_secs(300)))
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
    sets: Arc<DashMap<String, HashSet<String>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            sets: Arc::new(DashMap::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the current number of value entries in cache (sets excluded).
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if cache holds no values and no sets.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty() && self.sets.is_empty()
    }

    /// Whether `close()` has been called on this backend or any clone.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.data.len()).sum();
        let expired_count = self.store.iter().filter(|entry| entry.is_expired()).count();

        CacheStats {
            total_entries: self.store.len(),
            expired_entries: expired_count,
            total_sets: self.sets.len(),
            total_bytes,
        }
    }

    /// Print cache statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Cache Stats: {} entries ({} expired), {} sets, {} bytes",
            stats.total_entries, stats.expired_entries, stats.total_sets, stats.total_bytes
        );
    }

    fn ensure_open(&self, ctx: &Context) -> Result<()> {
        if self.is_closed() {
            return Err(Error::NoConnection);
        }
        ctx.check()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, ctx: &Context, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_open(ctx)?;

        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Remove expired entry if it exists
        self.store.remove_if(key, |_, entry| entry.is_expired());
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(
        &self,
        ctx: &Context,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.ensure_open(ctx)?;

        let entry = CacheEntry::new(value, ttl);
        self.store.insert(key.to_string(), entry);

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        self.ensure_open(ctx)?;

        // A key holds either a value or a set, like a Redis DEL
        self.store.remove(key);
        self.sets.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn add_to_set(&self, ctx: &Context, set_key: &str, member: &str) -> Result<()> {
        self.ensure_open(ctx)?;

        self.sets
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        debug!("✓ InMemory SADD {} {}", set_key, member);
        Ok(())
    }

    async fn members_of_set(&self, ctx: &Context, set_key: &str) -> Result<Vec<String>> {
        self.ensure_open(ctx)?;

        let members: Vec<String> = self
            .sets
            .get(set_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        debug!("✓ InMemory SMEMBERS {} -> {} members", set_key, members.len());
        Ok(members)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::NoConnection);
        }

        self.store.clear();
        self.sets.clear();
        info!("✓ InMemory backend closed");
        Ok(())
    }

    async fn health_check(&self, _ctx: &Context) -> Result<bool> {
        Ok(!self.is_closed())
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_sets: usize,
    pub total_bytes: usize,
}
