//! Feed-file importers: parse a directory of XML and merge it into the
//! catalog tables.

pub mod chains;
pub mod items;
pub mod prices;
pub mod stores;

use std::path::{Path, PathBuf};

use pricesync_feeds::{parse_store_identifier_file, FeedError};
use sqlx::PgPool;

use crate::error::PipelineError;

/// Run a sync feed parser on the blocking pool.
pub(crate) async fn blocking<T, F>(parse: F) -> Result<Result<T, FeedError>, PipelineError>
where
    F: FnOnce() -> Result<T, FeedError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(parse).await?)
}

/// The database id of the store a price or price-full file belongs to.
///
/// `None` skips the file: the header is unreadable, incomplete, or names a
/// store that is not in the `stores` table.
pub(crate) async fn resolve_store(pool: &PgPool, path: &Path) -> Result<Option<i64>, PipelineError> {
    let owned: PathBuf = path.to_path_buf();
    let identifier = match blocking(move || parse_store_identifier_file(&owned)).await? {
        Ok(Some(identifier)) => identifier,
        Ok(None) => {
            tracing::warn!(file = %path.display(), "file header has no store identifier, skipping");
            return Ok(None);
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "unreadable file header, skipping");
            return Ok(None);
        }
    };

    let store_id = pricesync_db::find_store_id(pool, identifier).await?;
    if store_id.is_none() {
        tracing::warn!(
            file = %path.display(),
            chain_id = identifier.chain_id,
            sub_chain_id = identifier.sub_chain_id,
            store_number = identifier.store_number,
            "unknown store, skipping file"
        );
    }
    Ok(store_id)
}
