//! Database operations for the `chains` table.

use chrono::{DateTime, Utc};
use pricesync_core::ChainRecord;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `chains` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChainRow {
    pub chain_id: i64,
    pub sub_chain_id: i64,
    pub chain_name: Option<String>,
    pub sub_chain_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert chains, overwriting the names of chains that already exist.
///
/// Returns the number of rows written. Runs as one `UNNEST` statement, so the
/// batch is applied atomically. Duplicate keys inside `chains` collapse to the
/// first occurrence; Postgres rejects an `ON CONFLICT DO UPDATE` that touches
/// the same row twice.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_chains(pool: &PgPool, chains: &[ChainRecord]) -> Result<u64, DbError> {
    if chains.is_empty() {
        return Ok(0);
    }

    let mut seen = std::collections::HashSet::with_capacity(chains.len());
    let mut chain_ids: Vec<i64> = Vec::with_capacity(chains.len());
    let mut sub_chain_ids: Vec<i64> = Vec::with_capacity(chains.len());
    let mut chain_names: Vec<Option<String>> = Vec::with_capacity(chains.len());
    let mut sub_chain_names: Vec<Option<String>> = Vec::with_capacity(chains.len());

    for chain in chains {
        if !seen.insert((chain.chain_id, chain.sub_chain_id)) {
            continue;
        }
        chain_ids.push(chain.chain_id);
        sub_chain_ids.push(chain.sub_chain_id);
        chain_names.push(chain.chain_name.clone());
        sub_chain_names.push(chain.sub_chain_name.clone());
    }

    let result = sqlx::query(
        "INSERT INTO chains (chain_id, sub_chain_id, chain_name, sub_chain_name) \
         SELECT * FROM UNNEST($1::int8[], $2::int8[], $3::text[], $4::text[]) \
         ON CONFLICT (chain_id, sub_chain_id) DO UPDATE SET \
             chain_name     = EXCLUDED.chain_name, \
             sub_chain_name = EXCLUDED.sub_chain_name",
    )
    .bind(&chain_ids)
    .bind(&sub_chain_ids)
    .bind(&chain_names)
    .bind(&sub_chain_names)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// List every chain ordered by its key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_chains(pool: &PgPool) -> Result<Vec<ChainRow>, DbError> {
    let rows = sqlx::query_as::<_, ChainRow>(
        "SELECT chain_id, sub_chain_id, chain_name, sub_chain_name, created_at \
         FROM chains \
         ORDER BY chain_id, sub_chain_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
