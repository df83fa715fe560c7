//! Scheduled price refresh.

use pricesync_core::{AppConfig, FileKind, PipelineStage};
use pricesync_db::PriceMergeSummary;
use pricesync_scraper::SourceDriver;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::fetch::{download_and_convert, Fetcher};
use crate::seed::prices::{import_prices, PriceImport};
use crate::workdir::clear_directory;
use crate::{with_run_lock, RunOutcome};

/// Download recent price files, merge them, and recompute price ranges.
///
/// Success marks `PRICE_UPDATE` completed. On failure the stage is marked
/// not completed before the error is returned. The prices directory is
/// cleared either way.
///
/// # Errors
///
/// Returns the error that stopped the refresh.
pub async fn run_refresh(
    pool: &PgPool,
    config: &AppConfig,
    fetcher: &Fetcher,
    drivers: &mut [Box<dyn SourceDriver>],
) -> Result<RunOutcome, PipelineError> {
    with_run_lock(pool, "refresh", async {
        let result = refresh_prices(pool, config, fetcher, drivers).await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "price refresh failed");
            if let Err(mark_err) =
                pricesync_db::mark_stage_not_completed(pool, PipelineStage::PriceUpdate).await
            {
                tracing::error!(error = %mark_err, "could not reset PRICE_UPDATE");
            }
        }
        if let Err(e) = clear_directory(&config.prices_dir) {
            tracing::warn!(error = %e, "could not clear prices directory");
        }

        result.map(|merged| {
            tracing::info!(
                inserted = merged.inserted,
                updated = merged.updated,
                stale = merged.stale,
                "price refresh completed"
            );
            RunOutcome::Completed
        })
    })
    .await
}

async fn refresh_prices(
    pool: &PgPool,
    config: &AppConfig,
    fetcher: &Fetcher,
    drivers: &mut [Box<dyn SourceDriver>],
) -> Result<PriceMergeSummary, PipelineError> {
    clear_directory(&config.prices_dir)?;
    download_and_convert(
        fetcher,
        drivers,
        FileKind::Price,
        config.lookback_hours,
        &config.prices_dir,
    )
    .await?;

    let batches = PriceImport {
        chunk_size: config.batch_size,
        flush_threshold: config.flush_threshold,
    };
    let merged = import_prices(pool, &config.prices_dir, batches).await?;
    pricesync_db::recompute_price_range(pool).await?;
    pricesync_db::mark_stage_completed(pool, PipelineStage::PriceUpdate).await?;
    Ok(merged)
}
