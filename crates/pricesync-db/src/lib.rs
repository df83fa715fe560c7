use pricesync_core::AppConfig;
use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, PgPool, Postgres};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/pricesync-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("unknown pipeline stage in ledger: {0}")]
    UnknownStage(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect using the database URL and pool settings carried by [`AppConfig`].
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if the URL is blank, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_config(config: &AppConfig) -> Result<PgPool, DbError> {
    if config.database_url.trim().is_empty() {
        return Err(DbError::MissingDatabaseUrl);
    }
    connect_pool(&config.database_url, PoolConfig::from_app_config(config))
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; absence counts as zero.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Run lock
// ---------------------------------------------------------------------------

/// A held session-level advisory lock.
///
/// The lock lives on one dedicated pooled connection. [`RunLock::release`]
/// unlocks and hands the connection back to the pool; dropping an unreleased
/// lock detaches and closes the connection, which ends the session and frees
/// the lock server-side.
pub struct RunLock {
    key: i64,
    conn: Option<PoolConnection<Postgres>>,
}

impl RunLock {
    #[must_use]
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Explicitly unlock and return the connection to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock statement fails.
    pub async fn release(mut self) -> Result<(), DbError> {
        if let Some(mut conn) = self.conn.take() {
            sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
                .bind(self.key)
                .fetch_one(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn.detach());
        }
    }
}

/// Try to take the advisory lock `key` without waiting.
///
/// Returns `None` when another session already holds it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a connection cannot be acquired or the query fails.
pub async fn try_acquire_run_lock(pool: &PgPool, key: i64) -> Result<Option<RunLock>, DbError> {
    let mut conn = pool.acquire().await?;
    let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
        .bind(key)
        .fetch_one(&mut *conn)
        .await?;

    if acquired {
        Ok(Some(RunLock {
            key,
            conn: Some(conn),
        }))
    } else {
        Ok(None)
    }
}


pub mod chains;
pub mod items;
pub mod ledger;
pub mod prices;
pub mod reconcile;
pub mod stores;

pub use chains::{list_chains, upsert_chains, ChainRow};
pub use items::{
    apply_item_categories, existing_item_codes, get_item, list_item_names, list_items_missing_image,
    seed_items, update_item_images, ItemCategoryUpdate, ItemImageUpdate, ItemNameRow, ItemRow,
};
pub use ledger::{
    is_stage_completed, list_stages, mark_stage_completed, mark_stage_not_completed,
    stage_report, StageReport, StageRow,
};
pub use prices::{
    get_price, merge_prices, price_update_applies, recompute_price_range, PriceMergeSummary,
    PriceRow,
};
pub use reconcile::{reconcile_chunked, Reconciled};
pub use stores::{
    find_store_id, list_store_cities, seed_stores, update_store_cities, StoreCityRow,
    StoreSeedSummary,
};
