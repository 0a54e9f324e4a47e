//! Pluggable payload codecs.
//!
//! A [`Codec`] turns a typed value into the exact bytes stored in the backend and
//! back. Payloads carry no framing, magic or checksum: what the codec produces is
//! what lands in the store.
//!
//! | Codec | Format | Notes |
//! |-------|--------|-------|
//! | [`JsonCodec`] (default) | UTF-8 JSON | Readable with `redis-cli`, shared with non-Rust readers |
//! | [`PostcardCodec`] | Postcard | Compact, Rust-only, schema must match exactly |
//!
//! # Example
//!
//! ```rust
//! use resource_cache::serialization::{Codec, JsonCodec, PostcardCodec};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # fn main() -> resource_cache::Result<()> {
//! let user = User { id: 1, name: "Alice".to_string() };
//!
//! let bytes = JsonCodec.encode(&user)?;
//! assert_eq!(bytes, br#"{"id":1,"name":"Alice"}"#);
//!
//! let compact = PostcardCodec.encode(&user)?;
//! let decoded: User = PostcardCodec.decode(&compact)?;
//! assert_eq!(user, decoded);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Byte-exact marshal/unmarshal pair used for cached payloads.
///
/// `decode(encode(v))` must equal `v` for every value the codec accepts.
pub trait Codec: Send + Sync + Clone + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the value cannot be encoded.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// # Errors
    ///
    /// Returns `Error::DeserializationError` if the bytes are malformed or do
    /// not describe a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON codec backed by `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| {
            error!("Cache serialization failed: {}", e);
            Error::SerializationError(e.to_string())
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            error!("Cache deserialization failed: {}", e);
            Error::DeserializationError(e.to_string())
        })
    }
}

/// Postcard codec.
///
/// Postcard is not self-describing: reordering or retyping fields of a cached
/// type makes existing entries fail to decode. Invalidate the resource when
/// deploying such a change.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostcardCodec;

impl Codec for PostcardCodec {
    fn name(&self) -> &'static str {
        "postcard"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        postcard::to_allocvec(value).map_err(|e| {
            error!("Cache serialization failed: {}", e);
            Error::SerializationError(e.to_string())
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        postcard::from_bytes(bytes).map_err(|e| {
            error!("Cache deserialization failed: {}", e);
            Error::DeserializationError(e.to_string())
        })
    }
}
