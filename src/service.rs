//! Cache application: owns the backend and hands out per-resource builders.
//!
//! Provides the entry point applications keep in their state and share across tasks.

use crate::backend::CacheBackend;
use crate::builder::CacheBuilder;
use crate::error::{Error, Result};
use crate::key::ResourceKey;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::serialization::{Codec, JsonCodec};
use std::sync::Arc;
use std::time::Duration;

/// State shared by a service and every builder and instance it produces.
///
/// Holds a clone of the backend handle, never the right to close it.
pub(crate) struct Shared<B: CacheBackend, C: Codec> {
    backend: Option<B>,
    pub(crate) codec: C,
    pub(crate) metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend, C: Codec> Shared<B, C> {
    pub(crate) fn backend(&self) -> Result<&B> {
        self.backend.as_ref().ok_or(Error::NoConnection)
    }
}

impl<B: CacheBackend, C: Codec> Clone for Shared<B, C> {
    fn clone(&self) -> Self {
        Shared {
            backend: self.backend.clone(),
            codec: self.codec.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Typed caching facade in front of one backend.
///
/// Cloning is cheap; clones share the backend handle. `build` is pure and
/// performs no I/O, so builders can be created per request.
///
/// # Example
///
/// ```ignore
/// use resource_cache::{CacheService, backend::InMemoryBackend, context::Context};
/// use resource_cache::observability::TtlPolicy;
/// use std::time::Duration;
///
/// let cache = CacheService::new(InMemoryBackend::new())
///     .with_ttl_policy(TtlPolicy::Fixed(Duration::from_secs(600)));
///
/// // In your web service struct
/// pub struct UserService {
///     cache: CacheService<InMemoryBackend>,
///     repo: Arc<UserRepository>,
/// }
///
/// impl UserService {
///     pub async fn get(&self, ctx: &Context, id: &str) -> Result<User, AppError> {
///         self.cache
///             .build("user")
///             .one::<User>(id)
///             .lazy_fetch(ctx, || self.repo.find(id))
///             .await
///     }
/// }
/// ```
pub struct CacheService<B: CacheBackend, C: Codec = JsonCodec> {
    shared: Shared<B, C>,
    ttl_policy: TtlPolicy,
}

impl<B: CacheBackend, C: Codec> Clone for CacheService<B, C> {
    fn clone(&self) -> Self {
        CacheService {
            shared: self.shared.clone(),
            ttl_policy: self.ttl_policy.clone(),
        }
    }
}

impl<B: CacheBackend> CacheService<B, JsonCodec> {
    /// Create a new cache service attached to `backend`.
    pub fn new(backend: B) -> Self {
        Self::from_parts(Some(backend))
    }

    /// Create a service with no backend attached.
    ///
    /// Builders still work, but every I/O operation and `close` fail with
    /// `Error::NoConnection`.
    pub fn detached() -> Self {
        Self::from_parts(None)
    }

    fn from_parts(backend: Option<B>) -> Self {
        CacheService {
            shared: Shared {
                backend,
                codec: JsonCodec,
                metrics: Arc::new(NoOpMetrics),
            },
            ttl_policy: TtlPolicy::default(),
        }
    }
}

impl<B: CacheBackend, C: Codec> CacheService<B, C> {
    /// Replace the payload codec.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> CacheService<B, C2> {
        CacheService {
            shared: Shared {
                backend: self.shared.backend,
                codec,
                metrics: self.shared.metrics,
            },
            ttl_policy: self.ttl_policy,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.shared.metrics = metrics;
        self
    }

    /// Set the TTL policy consulted by [`CacheService::build`].
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Builder for `resource`, with the TTL the policy assigns to it.
    pub fn build(&self, resource: impl Into<String>) -> CacheBuilder<B, C> {
        let key = ResourceKey::new(resource);
        let ttl = self.ttl_policy.get_ttl(key.raw());
        CacheBuilder::new(key, ttl, self.shared.clone())
    }

    /// Builder for `resource` with an explicit TTL, ignoring the policy.
    pub fn build_with_ttl(&self, resource: impl Into<String>, ttl: Duration) -> CacheBuilder<B, C> {
        CacheBuilder::new(ResourceKey::new(resource), Some(ttl), self.shared.clone())
    }

    /// The attached backend, if any.
    pub fn backend(&self) -> Option<&B> {
        self.shared.backend.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.shared.backend.is_some()
    }

    pub fn codec(&self) -> &C {
        &self.shared.codec
    }

    /// Release the backend connection.
    ///
    /// Builders and instances created earlier keep their handle but fail
    /// with `Error::NoConnection` from then on.
    ///
    /// # Errors
    ///
    /// - `Error::NoConnection` if no backend is attached or it was already closed
    /// - Any error the backend reports while releasing
    pub async fn close(&self) -> Result<()> {
        let backend = self.shared.backend()?;
        backend.close().await?;
        info!("✓ Cache service closed");
        Ok(())
    }
}
