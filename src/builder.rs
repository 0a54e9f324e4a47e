//! Per-resource cache builder and bulk invalidation.

use crate::backend::CacheBackend;
use crate::context::Context;
use crate::error::Result;
use crate::instance::CacheInstance;
use crate::key::ResourceKey;
use crate::serialization::{Codec, JsonCodec};
use crate::service::Shared;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::time::{Duration, Instant};

/// Produces [`CacheInstance`]s for one resource and invalidates them as a group.
///
/// Every key an instance writes is recorded in the resource's index set
/// (`<resource>:index`), which [`CacheBuilder::invalidate_all`] walks.
pub struct CacheBuilder<B: CacheBackend, C: Codec = JsonCodec> {
    key: ResourceKey,
    ttl: Option<Duration>,
    shared: Shared<B, C>,
}

impl<B: CacheBackend, C: Codec> Clone for CacheBuilder<B, C> {
    fn clone(&self) -> Self {
        CacheBuilder {
            key: self.key.clone(),
            ttl: self.ttl,
            shared: self.shared.clone(),
        }
    }
}

impl<B: CacheBackend, C: Codec> CacheBuilder<B, C> {
    pub(crate) fn new(key: ResourceKey, ttl: Option<Duration>, shared: Shared<B, C>) -> Self {
        CacheBuilder { key, ttl, shared }
    }

    pub fn resource(&self) -> &str {
        self.key.raw()
    }

    /// TTL given to every instance this builder produces. `None` means no expiry.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn index_key(&self) -> String {
        self.key.index()
    }

    /// Instance bound to `<resource>:id:<id>`.
    pub fn one<T>(&self, id: impl Display) -> CacheInstance<T, B, C>
    where
        T: Serialize + DeserializeOwned,
    {
        self.instance(self.key.member(&id))
    }

    /// Instance bound to `<resource>:all`.
    pub fn all<T>(&self) -> CacheInstance<T, B, C>
    where
        T: Serialize + DeserializeOwned,
    {
        self.instance(self.key.all())
    }

    fn instance<T>(&self, key: String) -> CacheInstance<T, B, C>
    where
        T: Serialize + DeserializeOwned,
    {
        CacheInstance::new(key, self.key.index(), self.ttl, self.shared.clone())
    }

    /// Keys currently listed in the resource's index set, sorted.
    ///
    /// May include keys already deleted individually or expired.
    ///
    /// # Errors
    ///
    /// Returns `Err` on backend, timeout or cancellation errors.
    pub async fn indexed_keys(&self, ctx: &Context) -> Result<Vec<String>> {
        let backend = self.shared.backend()?;
        let index_key = self.key.index();

        let mut keys = ctx.run(backend.members_of_set(ctx, &index_key)).await?;
        keys.sort();
        Ok(keys)
    }

    /// Delete every key ever written for this resource, then the index itself.
    ///
    /// Keys are deleted one at a time in sorted order. The first failing
    /// delete aborts the walk and is returned as-is: keys after it stay
    /// cached and the index is kept, so calling again resumes the work.
    ///
    /// # Errors
    ///
    /// Returns `Err` on backend, timeout or cancellation errors.
    pub async fn invalidate_all(&self, ctx: &Context) -> Result<()> {
        let timer = Instant::now();
        let backend = self.shared.backend()?;
        let index_key = self.key.index();

        let keys = self.indexed_keys(ctx).await?;
        debug!(
            "» Invalidating {} ({} indexed keys)",
            self.key.raw(),
            keys.len()
        );

        for (done, key) in keys.iter().enumerate() {
            if let Err(e) = ctx.run(backend.delete(ctx, key)).await {
                warn!(
                    "⚠ Invalidation of {} aborted at {} after {}/{} keys: {}",
                    self.key.raw(),
                    key,
                    done,
                    keys.len(),
                    e
                );
                self.shared.metrics.record_error(key, &e.to_string());
                return Err(e);
            }
        }

        if let Err(e) = ctx.run(backend.delete(ctx, &index_key)).await {
            self.shared.metrics.record_error(&index_key, &e.to_string());
            return Err(e);
        }

        self.shared
            .metrics
            .record_invalidate(self.key.raw(), keys.len(), timer.elapsed());
        info!(
            "✓ Invalidated {} ({} keys) in {:?}",
            self.key.raw(),
            keys.len(),
            timer.elapsed()
        );
        Ok(())
    }
}
