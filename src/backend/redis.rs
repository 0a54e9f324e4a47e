//! Redis cache backend implementation.

use super::CacheBackend;
use crate::context::Context;
use crate::error::{Error, Result};
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Connection, Pool, Runtime};
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
/// Formula: (CPU cores × 2) + 1
/// For 8-core systems: 16 connections is optimal
const DEFAULT_POOL_SIZE: u32 = 16;

/// Bound on the reachability probe run at construction.
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// PSETEX argument for `ttl`, or `None` to store without expiry.
///
/// Zero TTLs and TTLs beyond what Redis accepts (a signed 64-bit millisecond
/// count) are stored without expiry.
fn expiry_millis(ttl: Option<Duration>) -> Option<u64> {
    let duration = ttl.filter(|d| !d.is_zero())?;
    let millis = i64::try_from(duration.as_millis()).ok()?;
    u64::try_from(millis.max(1)).ok()
}

/// Configuration for Redis backend.
#[derive(Clone, Debug, PartialEq)]
pub struct RedisConfig {
    /// `host:port` of the server.
    pub address: String,
    pub password: Option<String>,
    /// Logical database index (`SELECT n`).
    pub database: i64,
    /// RESP protocol version, 2 or 3.
    pub protocol: u8,
    pub pool_size: u32,
    /// Upper bound for the PING probe in [`RedisBackend::connect`].
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            address: "localhost:6379".to_string(),
            password: None,
            database: 0,
            protocol: 2,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string. The password is percent-encoded.
    pub fn connection_string(&self) -> String {
        let mut url = match &self.password {
            Some(password) if !password.is_empty() => format!(
                "redis://default:{}@{}/{}",
                urlencoding::encode(password),
                self.address,
                self.database
            ),
            _ => format!("redis://{}/{}", self.address, self.database),
        };
        if self.protocol == 3 {
            url.push_str("?protocol=resp3");
        }
        url
    }
}

/// Raw, string-typed Redis settings as produced by a config loader.
///
/// Convert with `RedisConfig::try_from(settings)` to validate numeric fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RedisSettings {
    pub address: String,
    pub password: String,
    pub database: String,
    pub protocol_version: String,
}

impl RedisSettings {
    /// Read settings from `REDIS_SERVER_URL`, `REDIS_PASSWORD`, `REDIS_DB`
    /// and `REDIS_PROTOCOL_VERSION`. Unset variables read as empty.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        RedisSettings {
            address: var("REDIS_SERVER_URL"),
            password: var("REDIS_PASSWORD"),
            database: var("REDIS_DB"),
            protocol_version: var("REDIS_PROTOCOL_VERSION"),
        }
    }
}

impl TryFrom<RedisSettings> for RedisConfig {
    type Error = Error;

    fn try_from(settings: RedisSettings) -> Result<Self> {
        let defaults = RedisConfig::default();

        let database = match settings.database.trim() {
            "" => defaults.database,
            raw => raw
                .parse::<i64>()
                .map_err(|e| Error::ConfigError(format!("invalid REDIS_DB {:?}: {}", raw, e)))?,
        };

        let protocol = match settings.protocol_version.trim() {
            "" => defaults.protocol,
            raw => raw.parse::<u8>().map_err(|e| {
                Error::ConfigError(format!("invalid REDIS_PROTOCOL_VERSION {:?}: {}", raw, e))
            })?,
        };
        if protocol != 2 && protocol != 3 {
            return Err(Error::ConfigError(format!(
                "unsupported protocol version {}",
                protocol
            )));
        }

        let address = if settings.address.is_empty() {
            defaults.address.clone()
        } else {
            settings.address
        };

        Ok(RedisConfig {
            address,
            password: Some(settings.password).filter(|p| !p.is_empty()),
            database,
            protocol,
            ..defaults
        })
    }
}

/// Redis backend with connection pooling and async operations.
///
/// Uses deadpool for efficient async resource management and pooling.
///
/// # Example
///
/// ```no_run
/// # use resource_cache::backend::{RedisBackend, RedisConfig, CacheBackend};
/// # use resource_cache::context::Context;
/// # use resource_cache::error::Result;
/// # async fn example() -> Result<()> {
/// let backend = RedisBackend::connect(Some(RedisConfig::default())).await?;
/// let ctx = Context::background();
///
/// backend.set(&ctx, "user:id:1", b"value".to_vec(), None).await?;
/// let value = backend.get(&ctx, "user:id:1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Create new Redis backend from configuration and probe it.
    ///
    /// # Errors
    /// - `Error::ConfigNotFound` if `config` is `None`
    /// - `Error::BackendError` if pool creation fails or the PING probe fails
    /// - `Error::Timeout` if the probe does not answer within `connection_timeout`
    pub async fn connect(config: Option<RedisConfig>) -> Result<Self> {
        let config = config.ok_or(Error::ConfigNotFound)?;

        let mut cfg = PoolConfig::from_url(config.connection_string());
        cfg.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size as usize));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))?;

        let backend = RedisBackend { pool };
        let probe = Context::background().with_timeout(config.connection_timeout);
        if !probe.run(backend.health_check(&probe)).await? {
            return Err(Error::BackendError(format!(
                "Redis at {} did not answer PING",
                config.address
            )));
        }

        info!(
            "✓ Redis backend initialized: {} (db {}, RESP{})",
            config.address, config.database, config.protocol
        );

        Ok(backend)
    }

    /// Build configuration with [`RedisSettings::from_env`] and connect.
    ///
    /// # Errors
    /// Same as [`RedisBackend::connect`], plus `Error::ConfigError` for
    /// unparseable numeric settings.
    pub async fn from_env() -> Result<Self> {
        let config = RedisConfig::try_from(RedisSettings::from_env())?;
        Self::connect(Some(config)).await
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<Connection> {
        if self.pool.is_closed() {
            return Err(Error::NoConnection);
        }
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, ctx: &Context, key: &str) -> Result<Option<Vec<u8>>> {
        ctx.check()?;
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(
        &self,
        ctx: &Context,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        ctx.check()?;
        let mut conn = self.connection().await?;

        match expiry_millis(ttl) {
            Some(millis) => {
                // PSETEX keeps sub-second TTLs intact
                conn.pset_ex::<_, _, ()>(key, value, millis)
                    .await
                    .map_err(|e| {
                        Error::BackendError(format!("Redis PSETEX failed for key {}: {}", key, e))
                    })?;
                debug!("✓ Redis SET {} (TTL: {}ms)", key, millis);
            }
            _ => {
                conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                    Error::BackendError(format!("Redis SET failed for key {}: {}", key, e))
                })?;
                debug!("✓ Redis SET {}", key);
            }
        }

        Ok(())
    }

    async fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        ctx.check()?;
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn add_to_set(&self, ctx: &Context, set_key: &str, member: &str) -> Result<()> {
        ctx.check()?;
        let mut conn = self.connection().await?;

        conn.sadd::<_, _, ()>(set_key, member).await.map_err(|e| {
            Error::BackendError(format!("Redis SADD failed for key {}: {}", set_key, e))
        })?;

        debug!("✓ Redis SADD {} {}", set_key, member);
        Ok(())
    }

    async fn members_of_set(&self, ctx: &Context, set_key: &str) -> Result<Vec<String>> {
        ctx.check()?;
        let mut conn = self.connection().await?;

        let members: Vec<String> = conn.smembers(set_key).await.map_err(|e| {
            Error::BackendError(format!("Redis SMEMBERS failed for key {}: {}", set_key, e))
        })?;

        debug!("✓ Redis SMEMBERS {} -> {} members", set_key, members.len());
        Ok(members)
    }

    async fn close(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(Error::NoConnection);
        }

        self.pool.close();
        info!("✓ Redis backend closed");
        Ok(())
    }

    async fn health_check(&self, ctx: &Context) -> Result<bool> {
        ctx.check()?;
        let mut conn = self.connection().await?;

        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG" || pong.contains("PONG"))
    }
}
