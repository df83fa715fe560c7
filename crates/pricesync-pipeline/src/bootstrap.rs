//! One-time initial load, resumable stage by stage through the ledger.

use pricesync_core::{AppConfig, FileKind, PipelineStage};
use pricesync_scraper::SourceDriver;
use sqlx::PgPool;

use crate::classify::categorize_items;
use crate::error::PipelineError;
use crate::fetch::{download_and_convert, Fetcher};
use crate::images::enrich_images;
use crate::seed::chains::seed_chains;
use crate::seed::items::import_items;
use crate::seed::prices::{import_prices, PriceImport};
use crate::seed::stores::{clean_store_cities, seed_stores_from_dir};
use crate::workdir::clear_directory;
use crate::{with_run_lock, RunOutcome};

/// `true` when `stage` already ran; logs the skip.
async fn already_done(pool: &PgPool, stage: PipelineStage) -> Result<bool, PipelineError> {
    let done = pricesync_db::is_stage_completed(pool, stage).await?;
    if done {
        tracing::info!(%stage, "stage already completed, skipping");
    }
    Ok(done)
}

async fn finish(pool: &PgPool, stage: PipelineStage) -> Result<(), PipelineError> {
    pricesync_db::mark_stage_completed(pool, stage).await?;
    tracing::info!(%stage, "stage completed");
    Ok(())
}

/// Download every price-full file and seed the chain, store, item and price
/// tables from them.
///
/// Each stage is marked in the ledger as soon as it succeeds, so a failed run
/// resumes at the stage that failed. Once `INITIAL_LOAD` is marked this is a
/// no-op. Returns [`RunOutcome::Locked`] without doing anything if another
/// run holds the pipeline lock.
///
/// # Errors
///
/// Returns the first stage error. The ledger keeps every stage completed
/// before it.
pub async fn run_bootstrap(
    pool: &PgPool,
    config: &AppConfig,
    fetcher: &Fetcher,
    drivers: &mut [Box<dyn SourceDriver>],
) -> Result<RunOutcome, PipelineError> {
    with_run_lock(pool, "bootstrap", bootstrap_locked(pool, config, fetcher, drivers)).await
}

async fn bootstrap_locked(
    pool: &PgPool,
    config: &AppConfig,
    fetcher: &Fetcher,
    drivers: &mut [Box<dyn SourceDriver>],
) -> Result<RunOutcome, PipelineError> {
    if already_done(pool, PipelineStage::InitialLoad).await? {
        return Ok(RunOutcome::AlreadyCompleted);
    }

    if !already_done(pool, PipelineStage::PricefullLoad).await? {
        let stale = clear_directory(&config.pricefull_dir)?;
        if stale > 0 {
            tracing::info!(files = stale, "removed partial price-full download");
        }
        let summary = download_and_convert(
            fetcher,
            drivers,
            FileKind::PriceFull,
            config.lookback_hours,
            &config.pricefull_dir,
        )
        .await?;
        if summary.downloaded() == 0 {
            tracing::warn!("no price-full files were downloaded");
        }
        finish(pool, PipelineStage::PricefullLoad).await?;
    }

    if !already_done(pool, PipelineStage::TableSeeding).await? {
        seed_tables(pool, config).await?;
        clear_directory(&config.pricefull_dir)?;
        finish(pool, PipelineStage::TableSeeding).await?;
    }

    finish(pool, PipelineStage::InitialLoad).await?;
    Ok(RunOutcome::Completed)
}

async fn seed_tables(pool: &PgPool, config: &AppConfig) -> Result<(), PipelineError> {
    if !already_done(pool, PipelineStage::ChainTableInit).await? {
        seed_chains(pool, &config.chain_file).await?;
        finish(pool, PipelineStage::ChainTableInit).await?;
    }

    if !already_done(pool, PipelineStage::StoreTableInit).await? {
        let stores = seed_stores_from_dir(pool, &config.stores_dir, config.batch_size).await?;
        tracing::info!(inserted = stores.inserted, skipped = stores.skipped, "stores seeded");
        clean_store_cities(pool).await?;
        finish(pool, PipelineStage::StoreTableInit).await?;
    }

    if !already_done(pool, PipelineStage::ItemTableInit).await? {
        import_items(
            pool,
            &config.pricefull_dir,
            config.batch_size,
            config.flush_threshold,
        )
        .await?;
        if let Some(classifier) = &config.classifier {
            categorize_items(pool, classifier, config.category_fix_csv.as_deref()).await?;
        }
        if !config.image_catalogs.is_empty() {
            enrich_images(pool, &config.image_catalogs).await?;
        }
        finish(pool, PipelineStage::ItemTableInit).await?;
    }

    if !already_done(pool, PipelineStage::PriceLoad).await? {
        let batches = PriceImport {
            chunk_size: config.batch_size,
            flush_threshold: config.flush_threshold,
        };
        let merged = import_prices(pool, &config.pricefull_dir, batches).await?;
        let recomputed = pricesync_db::recompute_price_range(pool).await?;
        tracing::info!(
            inserted = merged.inserted,
            updated = merged.updated,
            stale = merged.stale,
            recomputed,
            "initial prices loaded"
        );
        finish(pool, PipelineStage::PriceLoad).await?;
    }

    Ok(())
}
