use std::{fmt, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::infrastructure::postgres::{
    PostgresContentItemRepository, PostgresMediaAssetRepository,
};
use crate::error::{CatalogError, Result};

/// Connection settings for the catalog database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
    pub min_idle: u32,
}

/// Pool plus the two Postgres repositories built on it.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
    media_assets: Arc<PostgresMediaAssetRepository>,
    content_items: Arc<PostgresContentItemRepository>,
}

impl fmt::Debug for PostgresCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresCatalog")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl PostgresCatalog {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(&settings.url)
            .await
            .map_err(|e| {
                CatalogError::Internal(format!(
                    "Database connection failed: {}",
                    e
                ))
            })?;

        info!(
            "Database pool initialized with max_connections={}, min_connections={}",
            settings.max_connections, settings.min_connections
        );

        Ok(Self::with_limits(
            pool,
            settings.max_connections,
            settings.min_connections,
        ))
    }

    /// Wraps an existing pool, e.g. the one handed out by `#[sqlx::test]`.
    pub fn from_pool(pool: PgPool) -> Self {
        let max = pool.options().get_max_connections();
        let min = pool.options().get_min_connections();
        Self::with_limits(pool, max, min)
    }

    fn with_limits(pool: PgPool, max_connections: u32, min_connections: u32) -> Self {
        Self {
            media_assets: Arc::new(PostgresMediaAssetRepository::new(pool.clone())),
            content_items: Arc::new(PostgresContentItemRepository::new(pool.clone())),
            pool,
            max_connections,
            min_connections,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn media_assets(&self) -> Arc<PostgresMediaAssetRepository> {
        Arc::clone(&self.media_assets)
    }

    pub fn content_items(&self) -> Arc<PostgresContentItemRepository> {
        Arc::clone(&self.content_items)
    }

    /// Round-trips a trivial statement to prove the pool can reach the server.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                CatalogError::Internal(format!("Database ping failed: {}", e))
            })?;
        Ok(())
    }

    /// Applies the embedded migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            CatalogError::Internal(format!("Migration failed: {}", e))
        })?;
        info!("Catalog schema is up to date");
        Ok(())
    }

    /// Get connection pool statistics for monitoring
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
            min_idle: self.min_connections,
        }
    }
}
