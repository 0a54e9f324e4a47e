//! Error types for the cache facade.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cache facade.
///
/// Every failure is returned to the immediate caller. A cache miss is never
/// an error: reads report absence as `Ok(None)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Required configuration was absent when constructing a backend.
    ///
    /// **Recovery:** Supply a configuration value and retry construction.
    ConfigNotFound,

    /// Configuration was present but invalid.
    ///
    /// Common causes:
    /// - Database selector or protocol version is not a number
    /// - Unsupported protocol version
    ConfigError(String),

    /// No backend connection is attached, or it was already released.
    ///
    /// Raised when:
    /// - `CacheService::close()` is called on a detached service
    /// - `close()` is called a second time
    /// - Any operation runs against a closed backend
    NoConnection,

    /// The requested backend variant is not registered.
    CacheVariantNotFound(String),

    /// Backend storage error (Redis connection lost, protocol error, etc).
    ///
    /// **Recovery:** Retry the operation or fall back to the source of truth.
    BackendError(String),

    /// Serialization failed when converting a value to cache bytes.
    ///
    /// The store is never touched when this is returned from a write.
    SerializationError(String),

    /// Deserialization failed when converting cache bytes to a value.
    ///
    /// A malformed payload is surfaced, never treated as a miss.
    ///
    /// **Recovery:** Delete the entry and repopulate it.
    DeserializationError(String),

    /// A caller-supplied fetch (database query, remote call) failed.
    RepositoryError(String),

    /// The context deadline elapsed before the backend call completed.
    Timeout(String),

    /// The context was cancelled before the backend call completed.
    Cancelled,

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigNotFound => write!(f, "Configuration not found"),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NoConnection => write!(f, "No cache connection"),
            Error::CacheVariantNotFound(name) => {
                write!(f, "Cache variant not found: {}", name)
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        match e {
            postcard::Error::SerializeBufferFull
            | postcard::Error::SerializeSeqLengthUnknown
            | postcard::Error::SerdeSerCustom => Error::SerializationError(e.to_string()),
            _ => Error::DeserializationError(e.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}
