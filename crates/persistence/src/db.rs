//! Connection pool for the registration store.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::{Duration, Instant};

use crate::metrics::record_pool_metrics;

/// Pool sizing and timeouts, resolved from the service configuration.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

/// Point-in-time view of the pool, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
    pub latency: Duration,
}

/// Opens the pool. Fails fast if the first connection cannot be established.
pub async fn create_pool(settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .min_connections(settings.min_connections.min(settings.max_connections))
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(&settings.url)
        .await?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Round-trips `SELECT 1` and reports pool occupancy.
///
/// Also refreshes the `database_connections_*` gauges.
pub async fn probe(pool: &PgPool) -> Result<PoolStatus, sqlx::Error> {
    let start = Instant::now();
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    let latency = start.elapsed();

    record_pool_metrics(pool);
    Ok(PoolStatus {
        size: pool.size(),
        idle: pool.num_idle(),
        latency,
    })
}
