use std::path::Path;

use pricesync_core::ItemRecord;
use pricesync_feeds::{clean_item, parse_item_file};
use sqlx::PgPool;

use super::{blocking, resolve_store};
use crate::error::PipelineError;
use crate::workdir::collect_xml_files;

/// Import items from every price-full file under `dir`.
///
/// Files for unknown stores are skipped. Cleaned items are buffered and
/// seeded whenever the buffer reaches `flush_threshold`. Returns the number
/// of new items.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if a lookup or insert fails.
pub async fn import_items(
    pool: &PgPool,
    dir: &Path,
    chunk_size: usize,
    flush_threshold: usize,
) -> Result<u64, PipelineError> {
    let mut buffer: Vec<ItemRecord> = Vec::new();
    let mut inserted = 0;

    for path in collect_xml_files(dir) {
        if resolve_store(pool, &path).await?.is_none() {
            continue;
        }

        let owned = path.clone();
        let items = match blocking(move || parse_item_file(&owned)).await? {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping malformed item file");
                continue;
            }
        };
        tracing::debug!(file = %path.display(), items = items.len(), "items parsed");
        buffer.extend(items.into_iter().map(clean_item));

        if buffer.len() >= flush_threshold {
            inserted += pricesync_db::seed_items(pool, std::mem::take(&mut buffer), chunk_size).await?;
        }
    }

    if !buffer.is_empty() {
        inserted += pricesync_db::seed_items(pool, buffer, chunk_size).await?;
    }

    tracing::info!(dir = %dir.display(), inserted, "items imported");
    Ok(inserted)
}
