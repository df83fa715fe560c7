use std::path::Path;

use chrono::{Local, NaiveDate};
use pricesync_core::PriceRecord;
use pricesync_db::PriceMergeSummary;
use pricesync_feeds::parse_price_file;
use sqlx::PgPool;

use super::{blocking, resolve_store};
use crate::error::PipelineError;
use crate::workdir::collect_xml_files;

/// Batch sizes for [`import_prices`].
#[derive(Debug, Clone, Copy)]
pub struct PriceImport {
    pub chunk_size: usize,
    pub flush_threshold: usize,
}

/// Merge prices from every price or price-full file under `dir`.
///
/// Per file: the store is resolved from the header (unknown → skipped),
/// prices are parsed, prices for items missing from the catalog are dropped,
/// and the rest are merged in batches of `flush_threshold`.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if a lookup or merge fails.
pub async fn import_prices(
    pool: &PgPool,
    dir: &Path,
    batches: PriceImport,
) -> Result<PriceMergeSummary, PipelineError> {
    let today = Local::now().date_naive();
    let mut total = PriceMergeSummary::default();

    for path in collect_xml_files(dir) {
        let Some(store_id) = resolve_store(pool, &path).await? else {
            continue;
        };
        let summary = import_price_file(pool, &path, store_id, today, batches).await?;
        tracing::info!(
            file = %path.display(),
            store_id,
            inserted = summary.inserted,
            updated = summary.updated,
            stale = summary.stale,
            "price file merged"
        );
        total.absorb(summary);
    }

    Ok(total)
}

async fn import_price_file(
    pool: &PgPool,
    path: &Path,
    store_id: i64,
    today: NaiveDate,
    batches: PriceImport,
) -> Result<PriceMergeSummary, PipelineError> {
    let mut summary = PriceMergeSummary::default();

    let owned = path.to_path_buf();
    let prices = match blocking(move || parse_price_file(&owned, today)).await? {
        Ok(prices) => prices,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "skipping malformed price file");
            return Ok(summary);
        }
    };

    let known = known_items(pool, prices, batches.chunk_size).await?;
    let mut buffer: Vec<PriceRecord> = Vec::with_capacity(batches.flush_threshold.min(known.len()));
    for price in known {
        buffer.push(price);
        if buffer.len() >= batches.flush_threshold {
            let chunk = std::mem::take(&mut buffer);
            summary.absorb(pricesync_db::merge_prices(pool, store_id, chunk, batches.chunk_size).await?);
        }
    }
    if !buffer.is_empty() {
        summary.absorb(pricesync_db::merge_prices(pool, store_id, buffer, batches.chunk_size).await?);
    }

    Ok(summary)
}

/// Keep only prices whose item already exists in the catalog.
async fn known_items(
    pool: &PgPool,
    prices: Vec<PriceRecord>,
    chunk_size: usize,
) -> Result<Vec<PriceRecord>, PipelineError> {
    let mut kept = Vec::with_capacity(prices.len());
    let mut dropped = 0usize;

    for chunk in prices.chunks(chunk_size.max(1)) {
        let codes: Vec<String> = chunk.iter().map(|p| p.item_code.clone()).collect();
        let existing = pricesync_db::existing_item_codes(pool, &codes).await?;
        for price in chunk {
            if existing.contains(&price.item_code) {
                kept.push(price.clone());
            } else {
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped prices for items not in the catalog");
    }
    Ok(kept)
}
