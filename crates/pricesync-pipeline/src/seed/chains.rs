use std::path::Path;

use pricesync_feeds::parse_chain_file;
use sqlx::PgPool;

use super::blocking;
use crate::error::PipelineError;

/// Parse the chain file and upsert every sub-chain. Returns rows written.
///
/// # Errors
///
/// Returns [`PipelineError::Feed`] if the chain file cannot be read or
/// parsed, or [`PipelineError::Db`] if the upsert fails.
pub async fn seed_chains(pool: &PgPool, chain_file: &Path) -> Result<u64, PipelineError> {
    let path = chain_file.to_path_buf();
    let chains = blocking(move || parse_chain_file(&path)).await??;
    let written = pricesync_db::upsert_chains(pool, &chains).await?;
    tracing::info!(file = %chain_file.display(), chains = chains.len(), written, "chains seeded");
    Ok(written)
}
