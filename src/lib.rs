//! # resource-cache
//!
//! A typed caching facade in front of a key-value store, with resource-scoped
//! keys and index-based bulk invalidation.
//!
//! ## Features
//!
//! - **Typed:** Cache any `T: Serialize + DeserializeOwned`, decoded on read
//! - **Structured keys:** `user:id:42`, `user:all`, derived from a resource name
//! - **Group invalidation:** Every written key is indexed in `user:index`, so
//!   `invalidate_all` clears a resource without tracking keys yourself
//! - **Read-through:** `lazy_fetch` falls back to your loader on a miss and caches the result
//! - **Backend agnostic:** In-memory (default) and Redis, or your own [`CacheBackend`]
//! - **Deadline aware:** Every I/O call runs within a cancellable [`Context`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use resource_cache::{CacheService, backend::InMemoryBackend, context::Context};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! let cache = CacheService::new(InMemoryBackend::new());
//! let ctx = Context::background().with_timeout(Duration::from_secs(1));
//!
//! // 1. Builder for a resource (no I/O)
//! let users = cache.build_with_ttl("user", Duration::from_secs(600));
//!
//! // 2. Read-through for one member
//! let user: User = users
//!     .one::<User>("42")
//!     .lazy_fetch(&ctx, || repo.find_user("42"))
//!     .await?;
//!
//! // 3. After a bulk write to the users table
//! users.invalidate_all(&ctx).await?;
//!
//! // 4. On shutdown
//! cache.close().await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod context;
pub mod error;
pub mod instance;
pub mod key;
pub mod observability;
pub mod registry;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use builder::CacheBuilder;
pub use context::{CancelHandle, Context};
pub use error::{Error, Result};
pub use instance::CacheInstance;
pub use key::ResourceKey;
pub use registry::BackendRegistry;
pub use serialization::{Codec, JsonCodec, PostcardCodec};
pub use service::CacheService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
