//! Typed cache instance bound to one fully-qualified key.

use crate::backend::CacheBackend;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::serialization::{Codec, JsonCodec};
use crate::service::Shared;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Read/write/delete/lazy-fetch surface for a value of type `T` stored at one key.
///
/// Created by [`CacheBuilder::one`](crate::CacheBuilder::one) or
/// [`CacheBuilder::all`](crate::CacheBuilder::all). Holds no cached data itself.
///
/// Per-key lifecycle:
///
/// ```text
/// Empty --set--> Present --delete / invalidate_all / TTL expiry--> Empty
/// ```
pub struct CacheInstance<T, B: CacheBackend, C: Codec = JsonCodec> {
    key: String,
    index_key: String,
    ttl: Option<Duration>,
    shared: Shared<B, C>,
    _value: PhantomData<fn() -> T>,
}

impl<T, B: CacheBackend, C: Codec> Clone for CacheInstance<T, B, C> {
    fn clone(&self) -> Self {
        CacheInstance {
            key: self.key.clone(),
            index_key: self.index_key.clone(),
            ttl: self.ttl,
            shared: self.shared.clone(),
            _value: PhantomData,
        }
    }
}

impl<T, B, C> CacheInstance<T, B, C>
where
    T: Serialize + DeserializeOwned,
    B: CacheBackend,
    C: Codec,
{
    pub(crate) fn new(
        key: String,
        index_key: String,
        ttl: Option<Duration>,
        shared: Shared<B, C>,
    ) -> Self {
        CacheInstance {
            key,
            index_key,
            ttl,
            shared,
            _value: PhantomData,
        }
    }

    /// The fully-qualified key this instance reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Read and decode the cached value.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - Cache hit
    /// - `Ok(None)` - Cache miss (never written, deleted or expired)
    ///
    /// # Errors
    ///
    /// - `Error::DeserializationError`: The stored payload is malformed
    /// - `Error::BackendError`: Cache backend is unavailable
    /// - `Error::Timeout` / `Error::Cancelled`: Context fired first
    /// - `Error::NoConnection`: Backend closed or never attached
    pub async fn get(&self, ctx: &Context) -> Result<Option<T>> {
        let timer = Instant::now();
        let result = self.fetch_decoded(ctx).await;

        match &result {
            Ok(Some(_)) => self.shared.metrics.record_hit(&self.key, timer.elapsed()),
            Ok(None) => self.shared.metrics.record_miss(&self.key, timer.elapsed()),
            Err(e) => self.shared.metrics.record_error(&self.key, &e.to_string()),
        }
        result
    }

    async fn fetch_decoded(&self, ctx: &Context) -> Result<Option<T>> {
        let backend = self.shared.backend()?;

        match ctx.run(backend.get(ctx, &self.key)).await? {
            Some(bytes) => self.shared.codec.decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Whether a value is currently stored, without decoding it.
    ///
    /// # Errors
    ///
    /// Returns `Err` on backend, timeout or cancellation errors.
    pub async fn exists(&self, ctx: &Context) -> Result<bool> {
        let backend = self.shared.backend()?;
        Ok(ctx.run(backend.get(ctx, &self.key)).await?.is_some())
    }

    /// Encode and store `value`, then record the key in the resource index.
    ///
    /// The two backend writes are not atomic. If the payload write succeeds and
    /// the index write fails, the value stays readable through [`get`](Self::get)
    /// but is skipped by `invalidate_all` until a later `set` indexes it.
    ///
    /// # Errors
    ///
    /// - `Error::SerializationError`: `value` cannot be encoded; nothing is written
    /// - `Error::BackendError`: Either backend write failed
    /// - `Error::Timeout` / `Error::Cancelled`: Context fired first
    /// - `Error::NoConnection`: Backend closed or never attached
    pub async fn set(&self, ctx: &Context, value: &T) -> Result<()> {
        let timer = Instant::now();
        let result = self.store(ctx, value).await;

        match &result {
            Ok(()) => self.shared.metrics.record_set(&self.key, timer.elapsed()),
            Err(e) => self.shared.metrics.record_error(&self.key, &e.to_string()),
        }
        result
    }

    async fn store(&self, ctx: &Context, value: &T) -> Result<()> {
        let backend = self.shared.backend()?;
        let bytes = self.shared.codec.encode(value)?;

        ctx.run(backend.set(ctx, &self.key, bytes, self.ttl)).await?;

        if let Err(e) = ctx
            .run(backend.add_to_set(ctx, &self.index_key, &self.key))
            .await
        {
            warn!(
                "⚠ {} written but not added to {}: {}",
                self.key, self.index_key, e
            );
            return Err(e);
        }

        Ok(())
    }

    /// Remove the cached value. Removing an absent value succeeds.
    ///
    /// The key stays listed in the resource index until the next `invalidate_all`.
    ///
    /// # Errors
    ///
    /// Returns `Err` on backend, timeout or cancellation errors.
    pub async fn delete(&self, ctx: &Context) -> Result<()> {
        let timer = Instant::now();
        let result = match self.shared.backend() {
            Ok(backend) => ctx.run(backend.delete(ctx, &self.key)).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => self.shared.metrics.record_delete(&self.key, timer.elapsed()),
            Err(e) => self.shared.metrics.record_error(&self.key, &e.to_string()),
        }
        result
    }

    /// Read-through: return the cached value, or produce, cache and return it.
    ///
    /// - Hit: returns the cached value; `fetch` is not called.
    /// - Miss: calls `fetch` once. A fetch error is returned and nothing is cached.
    ///   On success the value is stored with [`set`](Self::set) before being returned.
    /// - If storing the fetched value fails, that error is returned and the
    ///   fetched value is dropped.
    ///
    /// The error type is the caller's, as long as cache errors convert into it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let user: User = cache
    ///     .build("user")
    ///     .one::<User>(id)
    ///     .lazy_fetch(&ctx, || async { repo.find(id).await })
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Any error from `get`, from `fetch`, or from `set`, in that order.
    pub async fn lazy_fetch<F, Fut, E>(&self, ctx: &Context, fetch: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<Error>,
    {
        if let Some(cached) = self.get(ctx).await? {
            return Ok(cached);
        }

        debug!("Cache miss for {}, invoking fetch", self.key);
        let value = fetch().await?;

        self.set(ctx, &value).await?;
        Ok(value)
    }
}
