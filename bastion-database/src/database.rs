use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, migrate::Migrator};
use tracing::info;

use crate::cache::CacheService;

/// Migrations for the protection and exemption tables.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Handle to persisted guild configuration: PostgreSQL plus the read cache.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
}

impl Database {
    /// Open a pool against `url` and attach `cache`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        cache: CacheService,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "PostgreSQL connection established.");

        Ok(Self::with_cache(pool, cache))
    }

    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied.");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}
