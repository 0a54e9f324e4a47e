//! Redis Backend Integration Tests
//!
//! These tests require a running Redis instance and skip themselves otherwise.
//!
//! ```bash
//! docker run --rm -p 6379:6379 redis:7
//! cargo test --features redis --test redis_integration_test
//! ```
//!
//! ## Environment Variables
//!
//! - `TEST_REDIS_ADDR`: Redis `host:port` (default: "localhost:6379")
//!
//! ## What's Tested
//!
//! 1. Connection probe and configuration errors
//! 2. Typed set/get/delete through the facade
//! 3. Index set bookkeeping and bulk invalidation
//! 4. TTL expiration
//! 5. Close semantics

#![cfg(feature = "redis")]

use resource_cache::backend::{CacheBackend, RedisBackend, RedisConfig};
use resource_cache::{CacheService, Context, Error};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct Product {
    sku: String,
    name: String,
    price_cents: u64,
}

/// Helper: Redis address from environment or default
fn redis_addr() -> String {
    env::var("TEST_REDIS_ADDR").unwrap_or_else(|_| "localhost:6379".to_string())
}

fn test_config() -> RedisConfig {
    RedisConfig {
        address: redis_addr(),
        pool_size: 4,
        connection_timeout: Duration::from_secs(2),
        ..RedisConfig::default()
    }
}

/// Helper: Resource name unique to this test run
fn unique_resource(base: &str) -> String {
    format!("test_{}_{}", Uuid::now_v7().simple(), base)
}

/// Helper: Connect, or `None` when no server is reachable
async fn connect() -> Option<RedisBackend> {
    match RedisBackend::connect(Some(test_config())).await {
        Ok(backend) => Some(backend),
        Err(e) => {
            println!("⚠️  Redis not available ({}), skipping test", e);
            None
        }
    }
}

// =============================================================================
// Test 1: Connection
// =============================================================================

#[tokio::test]
async fn test_redis_connect_requires_config() {
    assert!(matches!(
        RedisBackend::connect(None).await,
        Err(Error::ConfigNotFound)
    ));
}

#[tokio::test]
async fn test_redis_connection() {
    let Some(backend) = connect().await else {
        return;
    };

    let ctx = Context::background();
    assert!(backend
        .health_check(&ctx)
        .await
        .expect("Health check should not error"));

    // The probe connection is back in the pool
    let stats = backend.pool_stats();
    assert!(stats.connections >= 1);
    assert!(stats.idle_connections <= stats.connections);
    println!(
        "✓ Redis connection successful ({} pooled, {} idle)",
        stats.connections, stats.idle_connections
    );
}

// =============================================================================
// Test 2: Typed Set/Get/Delete
// =============================================================================

#[tokio::test]
async fn test_redis_typed_round_trip() {
    let Some(backend) = connect().await else {
        return;
    };

    let cache = CacheService::new(backend.clone());
    let ctx = Context::background().with_timeout(Duration::from_secs(5));
    let resource = unique_resource("product");
    let products = cache.build(resource.clone());

    let lamp = Product {
        sku: "L-100".to_string(),
        name: "Desk lamp".to_string(),
        price_cents: 2999,
    };

    let instance = products.one::<Product>(&lamp.sku);
    assert_eq!(instance.get(&ctx).await.expect("GET should not error"), None);

    instance.set(&ctx, &lamp).await.expect("SET should succeed");
    assert_eq!(
        instance.get(&ctx).await.expect("GET should not error"),
        Some(lamp)
    );

    // Payload is plain JSON under the documented key
    let raw = backend
        .get(&ctx, &format!("{}:id:L-100", resource))
        .await
        .expect("raw GET should not error")
        .expect("raw value should exist");
    assert!(raw.starts_with(b"{\"sku\":\"L-100\""));

    instance.delete(&ctx).await.expect("DELETE should succeed");
    instance.delete(&ctx).await.expect("second DELETE should succeed");
    assert_eq!(instance.get(&ctx).await.expect("GET should not error"), None);

    products
        .invalidate_all(&ctx)
        .await
        .expect("Cleanup should succeed");
}

// =============================================================================
// Test 3: Index Set and Bulk Invalidation
// =============================================================================

#[tokio::test]
async fn test_redis_bulk_invalidation() {
    let Some(backend) = connect().await else {
        return;
    };

    let cache = CacheService::new(backend.clone());
    let ctx = Context::background().with_timeout(Duration::from_secs(5));
    let resource = unique_resource("user");
    let users = cache.build(resource.clone());

    for id in 1..=3u32 {
        users
            .one::<u32>(id)
            .set(&ctx, &id)
            .await
            .expect("SET should succeed");
    }
    users
        .all::<Vec<u32>>()
        .set(&ctx, &vec![1, 2, 3])
        .await
        .expect("SET all should succeed");

    assert_eq!(
        users.indexed_keys(&ctx).await.expect("SMEMBERS should succeed"),
        vec![
            format!("{}:all", resource),
            format!("{}:id:1", resource),
            format!("{}:id:2", resource),
            format!("{}:id:3", resource),
        ]
    );

    users
        .invalidate_all(&ctx)
        .await
        .expect("Invalidation should succeed");

    for id in 1..=3u32 {
        assert_eq!(
            users.one::<u32>(id).get(&ctx).await.expect("GET should not error"),
            None
        );
    }
    assert!(backend
        .members_of_set(&ctx, &users.index_key())
        .await
        .expect("SMEMBERS should succeed")
        .is_empty());
}

// =============================================================================
// Test 4: TTL Expiration
// =============================================================================

#[tokio::test]
async fn test_redis_ttl_expiration() {
    let Some(backend) = connect().await else {
        return;
    };

    let cache = CacheService::new(backend);
    let ctx = Context::background();
    let sessions = cache.build_with_ttl(unique_resource("session"), Duration::from_millis(500));
    let instance = sessions.one::<String>("abc");

    instance
        .set(&ctx, &"token".to_string())
        .await
        .expect("SET should succeed");
    assert!(instance.exists(&ctx).await.expect("GET should not error"));

    tokio::time::sleep(Duration::from_millis(900)).await;

    assert!(!instance.exists(&ctx).await.expect("GET should not error"));
    sessions
        .invalidate_all(&ctx)
        .await
        .expect("Cleanup should succeed");
}

#[tokio::test]
async fn test_redis_unrepresentable_ttl_stores_without_expiry() {
    let Some(backend) = connect().await else {
        return;
    };

    let cache = CacheService::new(backend);
    let ctx = Context::background().with_timeout(Duration::MAX);
    let forever = cache.build_with_ttl(unique_resource("config"), Duration::MAX);
    let instance = forever.one::<u32>(1);

    instance.set(&ctx, &7).await.expect("SET should succeed");
    assert_eq!(instance.get(&ctx).await.expect("GET should not error"), Some(7));
    forever
        .invalidate_all(&ctx)
        .await
        .expect("Cleanup should succeed");
}

// =============================================================================
// Test 5: Close
// =============================================================================

#[tokio::test]
async fn test_redis_close() {
    let Some(backend) = connect().await else {
        return;
    };

    let cache = CacheService::new(backend);
    let users = cache.build(unique_resource("user"));

    cache.close().await.expect("First close should succeed");
    assert_eq!(cache.close().await, Err(Error::NoConnection));

    let ctx = Context::background();
    assert_eq!(
        users.one::<u32>(1).get(&ctx).await,
        Err(Error::NoConnection)
    );
}
