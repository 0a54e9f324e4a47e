//! Cache key derivation for resources.
//!
//! Key layout in the backend:
//!
//! ```text
//! <resource>:id:<member>   one member of the resource
//! <resource>:all           the whole collection
//! <resource>:index         set of every key above ever written
//! ```
//!
//! The `:` separator is not escaped. A member id that itself contains `:id:`
//! can yield a key that also parses as a different (resource, member) pair.

use std::fmt::Display;

const MEMBER_SEGMENT: &str = "id";
const ALL_SEGMENT: &str = "all";
const INDEX_SEGMENT: &str = "index";

/// Key builder for one resource (e.g. `"user"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    raw: String,
}

impl ResourceKey {
    pub fn new(raw: impl Into<String>) -> Self {
        ResourceKey { raw: raw.into() }
    }

    /// The resource name this key builder was created from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Key for a single member: `<resource>:id:<member>`.
    pub fn member(&self, id: &dyn Display) -> String {
        format!("{}:{}:{}", self.raw, MEMBER_SEGMENT, id)
    }

    /// Key for the whole collection: `<resource>:all`.
    pub fn all(&self) -> String {
        build_composite(&[&self.raw, ALL_SEGMENT])
    }

    /// Key of the index set: `<resource>:index`.
    pub fn index(&self) -> String {
        build_composite(&[&self.raw, INDEX_SEGMENT])
    }
}

/// Build composite key from multiple parts.
pub fn build_composite(parts: &[&str]) -> String {
    parts.join(":")
}
