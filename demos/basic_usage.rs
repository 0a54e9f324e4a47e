//! Basic usage of the resource cache: read-through, writes, and group invalidation.

use resource_cache::{
    backend::{CacheBackend, InMemoryBackend},
    error::{Error, Result},
    CacheService, Context,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Example resource: Employment
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Employment {
    id: String,
    employer_name: String,
    salary: f64,
}

/// Mock repository that simulates database access
struct EmploymentRepository {
    rows: HashMap<String, Employment>,
    queries: AtomicUsize,
}

impl EmploymentRepository {
    fn new() -> Self {
        let rows = [
            ("emp_001", "Acme Corp", 75000.0),
            ("emp_002", "Tech Inc", 95000.0),
        ]
        .into_iter()
        .map(|(id, employer, salary)| {
            (
                id.to_string(),
                Employment {
                    id: id.to_string(),
                    employer_name: employer.to_string(),
                    salary,
                },
            )
        })
        .collect();

        EmploymentRepository {
            rows,
            queries: AtomicUsize::new(0),
        }
    }

    async fn find(&self, id: &str) -> Result<Employment> {
        println!("  [DB] Fetching employment: {}", id);
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.rows
            .get(id)
            .cloned()
            .ok_or_else(|| Error::RepositoryError(format!("employment {} not found", id)))
    }

    async fn find_all(&self) -> Result<Vec<Employment>> {
        println!("  [DB] Fetching all employments");
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut all: Vec<Employment> = self.rows.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Resource Cache - Basic Example ===\n");

    // 1. Initialize cache backend
    println!("1. Initializing in-memory cache backend...");
    let backend = InMemoryBackend::new();
    let cache = CacheService::new(backend.clone());
    let repository = EmploymentRepository::new();
    let ctx = Context::background().with_timeout(Duration::from_secs(5));

    let employments = cache.build_with_ttl("employment", Duration::from_secs(600));
    println!("   ✓ Cache ready, index key: {}\n", employments.index_key());

    // 2. First request - cache miss, fetch from database
    println!("2. First request for employment (emp_001):");
    let emp = employments
        .one::<Employment>("emp_001")
        .lazy_fetch(&ctx, || repository.find("emp_001"))
        .await?;
    println!(
        "   ✓ Employment loaded: {} from {} (${:.2})\n",
        emp.employer_name, emp.id, emp.salary
    );

    // 3. Second request - cache hit
    println!("3. Second request for same employment (emp_001):");
    let emp = employments
        .one::<Employment>("emp_001")
        .lazy_fetch(&ctx, || repository.find("emp_001"))
        .await?;
    println!(
        "   ✓ Employment loaded from cache: {} (${:.2})\n",
        emp.employer_name, emp.salary
    );

    // 4. Collection entry
    println!("4. Loading the full collection:");
    let all = employments
        .all::<Vec<Employment>>()
        .lazy_fetch(&ctx, || repository.find_all())
        .await?;
    println!("   ✓ {} employments cached under employment:all\n", all.len());

    // 5. Missing rows surface the loader's error and cache nothing
    println!("5. Request for a missing employment (emp_404):");
    let missing = employments.one::<Employment>("emp_404");
    match missing.lazy_fetch(&ctx, || repository.find("emp_404")).await {
        Ok(_) => println!("   ✗ Unexpected hit"),
        Err(e) => println!("   ✓ Loader error propagated: {}", e),
    }
    println!("   ✓ Cached: {}\n", missing.exists(&ctx).await?);

    // 6. Bulk invalidation after a write to the employments table
    println!("6. Invalidating every employment entry:");
    println!("   Indexed keys: {:?}", employments.indexed_keys(&ctx).await?);
    employments.invalidate_all(&ctx).await?;
    println!(
        "   ✓ Index cleared, remaining entries: {}\n",
        backend.len().await
    );

    // 7. Next read goes back to the database
    println!("7. Request after invalidation (emp_001):");
    employments
        .one::<Employment>("emp_001")
        .lazy_fetch(&ctx, || repository.find("emp_001"))
        .await?;
    println!(
        "   ✓ Database queries so far: {}\n",
        repository.queries.load(Ordering::SeqCst)
    );

    // 8. Shutdown
    println!("8. Closing the cache:");
    backend.log_stats().await;
    cache.close().await?;
    println!("   ✓ Backend healthy after close: {}", backend.health_check(&ctx).await?);

    println!("\n=== Example Complete ===\n");
    Ok(())
}
