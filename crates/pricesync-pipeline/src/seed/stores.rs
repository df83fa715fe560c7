use std::path::Path;

use pricesync_db::StoreSeedSummary;
use pricesync_feeds::{normalize_city, parse_store_file};
use sqlx::PgPool;

use super::blocking;
use crate::error::PipelineError;
use crate::workdir::collect_xml_files;

/// Seed stores from every store file under `dir`.
///
/// A file that fails to parse is logged and skipped.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if a seed query fails.
pub async fn seed_stores_from_dir(
    pool: &PgPool,
    dir: &Path,
    chunk_size: usize,
) -> Result<StoreSeedSummary, PipelineError> {
    let mut total = StoreSeedSummary::default();

    for path in collect_xml_files(dir) {
        let owned = path.clone();
        let stores = match blocking(move || parse_store_file(&owned)).await? {
            Ok(stores) => stores,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping malformed store file");
                continue;
            }
        };

        let summary = pricesync_db::seed_stores(pool, stores, chunk_size).await?;
        tracing::info!(
            file = %path.display(),
            inserted = summary.inserted,
            skipped = summary.skipped,
            "store file seeded"
        );
        total.inserted += summary.inserted;
        total.skipped += summary.skipped;
    }

    Ok(total)
}

/// Rewrite every store city to its canonical spelling.
///
/// Only cities that normalize to a different value are written. Returns the
/// number of stores updated.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the read or update fails.
pub async fn clean_store_cities(pool: &PgPool) -> Result<u64, PipelineError> {
    let updates: Vec<(i64, String)> = pricesync_db::list_store_cities(pool)
        .await?
        .into_iter()
        .filter_map(|row| {
            let current = row.city?;
            let canonical = normalize_city(&current)?;
            (canonical != current).then_some((row.store_id, canonical))
        })
        .collect();

    let updated = pricesync_db::update_store_cities(pool, &updates).await?;
    tracing::info!(updated, "store cities normalized");
    Ok(updated)
}
