//! Cache backend implementations.

use crate::context::Context;
use crate::error::Result;
use std::time::Duration;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig, RedisSettings};

/// Trait for key-value stores the cache facade runs on.
///
/// Abstracts the storage operations the facade needs: plain keys with expiry,
/// plus string sets used as per-resource key indexes.
/// Implementations: InMemory (default), Redis.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// A backend value is a cheap handle onto shared state (pool, map); clones share it.
///
/// **ASYNC:** All methods are async and must be awaited. Each I/O method receives
/// the caller's [`Context`]; the facade additionally races every call against it.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache
    /// - `Ok(None)` - Cache miss (key absent or expired)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    async fn get(&self, ctx: &Context, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value in cache with optional TTL.
    ///
    /// # Arguments
    /// - `key`: Cache key
    /// - `value`: Serialized payload bytes
    /// - `ttl`: Time-to-live. None = no expiry
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, ctx: &Context, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<()>;

    /// Remove value from cache. Removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, ctx: &Context, key: &str) -> Result<()>;

    /// Add `member` to the set stored at `set_key`, creating the set if needed.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn add_to_set(&self, ctx: &Context, set_key: &str, member: &str) -> Result<()>;

    /// List the members of the set stored at `set_key`.
    ///
    /// An absent set yields an empty list. Order is unspecified.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn members_of_set(&self, ctx: &Context, set_key: &str) -> Result<Vec<String>>;

    /// Release the underlying connection.
    ///
    /// Affects every clone of this handle.
    ///
    /// # Errors
    /// Returns `Error::NoConnection` if the backend was already closed.
    async fn close(&self) -> Result<()>;

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self, _ctx: &Context) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_health_check_default() {
        let backend = InMemoryBackend::new();
        let ctx = Context::background();
        assert!(backend
            .health_check(&ctx)
            .await
            .expect("Failed to check health"));
    }
}
