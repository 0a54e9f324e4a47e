//! Registry of named backend variants.
//!
//! Lets an application configure several stores at startup (e.g. `"primary"`,
//! `"sessions"`) and pick one by name later. Use an enum implementing
//! [`CacheBackend`] when the variants have different concrete types.

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::service::CacheService;
use std::collections::HashMap;

/// Name-to-backend lookup table, populated at startup.
pub struct BackendRegistry<B: CacheBackend> {
    backends: HashMap<String, B>,
}

impl<B: CacheBackend> BackendRegistry<B> {
    pub fn new() -> Self {
        BackendRegistry {
            backends: HashMap::new(),
        }
    }

    /// Register `backend` under `name`, returning any backend it replaces.
    pub fn register(&mut self, name: impl Into<String>, backend: B) -> Option<B> {
        let name = name.into();
        debug!("Registering cache backend {}", name);
        self.backends.insert(name, backend)
    }

    /// Look up a backend by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheVariantNotFound` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<&B> {
        self.backends
            .get(name)
            .ok_or_else(|| Error::CacheVariantNotFound(name.to_string()))
    }

    /// A [`CacheService`] over the backend registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheVariantNotFound` if nothing is registered under `name`.
    pub fn service(&self, name: &str) -> Result<CacheService<B>> {
        self.get(name).map(|backend| CacheService::new(backend.clone()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Close every registered backend.
    ///
    /// All backends are attempted; the first error encountered is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error any backend reported while closing.
    pub async fn close_all(&self) -> Result<()> {
        let mut first_error = None;
        for name in self.names() {
            if let Err(e) = self.backends[name].close().await {
                warn!("⚠ Failed to close cache backend {}: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<B: CacheBackend> Default for BackendRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
