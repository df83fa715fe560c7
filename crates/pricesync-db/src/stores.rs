//! Database operations for the `stores` table.

use std::collections::{HashMap, HashSet};

use pricesync_core::{StoreIdentifier, StoreRecord};
use sqlx::PgPool;

use crate::reconcile::reconcile_chunked;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Result of [`seed_stores`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSeedSummary {
    pub inserted: u64,
    /// Rows not written: unknown chain, missing chain ids, already stored,
    /// or repeated within the batch.
    pub skipped: u64,
}

/// A store's surrogate id with its current city.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreCityRow {
    pub store_id: i64,
    pub city: Option<String>,
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert stores whose chain is known and whose natural key is not stored yet.
///
/// Existing stores are never modified. Each chunk is one `UNNEST` insert with
/// `ON CONFLICT DO NOTHING` on the natural key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any lookup or insert fails.
pub async fn seed_stores(
    pool: &PgPool,
    stores: Vec<StoreRecord>,
    chunk_size: usize,
) -> Result<StoreSeedSummary, DbError> {
    let total = stores.len() as u64;
    if stores.is_empty() {
        return Ok(StoreSeedSummary::default());
    }

    let known_chains = known_chain_keys(pool).await?;

    let candidates: Vec<(StoreIdentifier, StoreRecord)> = stores
        .into_iter()
        .filter_map(|store| store.identifier().map(|id| (id, store)))
        .filter(|(id, _)| known_chains.contains(&(id.chain_id, id.sub_chain_id)))
        .collect();

    let reconciled = reconcile_chunked(
        candidates,
        chunk_size,
        |(id, _): &(StoreIdentifier, StoreRecord)| *id,
        |keys| existing_store_keys(pool, keys),
        |_: &(), _: &(StoreIdentifier, StoreRecord)| false,
    )
    .await?;

    let mut inserted = 0u64;
    for chunk in reconciled.inserts.chunks(chunk_size.max(1)) {
        inserted += insert_stores(pool, chunk).await?;
    }

    Ok(StoreSeedSummary {
        inserted,
        skipped: total - inserted,
    })
}

async fn known_chain_keys(pool: &PgPool) -> Result<HashSet<(i64, i64)>, DbError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as("SELECT chain_id, sub_chain_id FROM chains")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

async fn existing_store_keys(
    pool: &PgPool,
    keys: Vec<StoreIdentifier>,
) -> Result<HashMap<StoreIdentifier, ()>, DbError> {
    let chain_ids: Vec<i64> = keys.iter().map(|k| k.chain_id).collect();
    let sub_chain_ids: Vec<i64> = keys.iter().map(|k| k.sub_chain_id).collect();
    let store_numbers: Vec<i64> = keys.iter().map(|k| k.store_number).collect();

    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        "SELECT s.chain_id, s.sub_chain_id, s.store_number \
         FROM stores s \
         JOIN UNNEST($1::int8[], $2::int8[], $3::int8[]) \
              AS k(chain_id, sub_chain_id, store_number) \
           ON s.chain_id = k.chain_id \
          AND s.sub_chain_id = k.sub_chain_id \
          AND s.store_number = k.store_number",
    )
    .bind(&chain_ids)
    .bind(&sub_chain_ids)
    .bind(&store_numbers)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(chain_id, sub_chain_id, store_number)| {
            (
                StoreIdentifier {
                    chain_id,
                    sub_chain_id,
                    store_number,
                },
                (),
            )
        })
        .collect())
}

async fn insert_stores(
    pool: &PgPool,
    chunk: &[(StoreIdentifier, StoreRecord)],
) -> Result<u64, DbError> {
    let mut chain_ids: Vec<i64> = Vec::with_capacity(chunk.len());
    let mut sub_chain_ids: Vec<i64> = Vec::with_capacity(chunk.len());
    let mut store_numbers: Vec<i64> = Vec::with_capacity(chunk.len());
    let mut names: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut cities: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut addresses: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut zip_codes: Vec<Option<i64>> = Vec::with_capacity(chunk.len());

    for (id, store) in chunk {
        chain_ids.push(id.chain_id);
        sub_chain_ids.push(id.sub_chain_id);
        store_numbers.push(id.store_number);
        names.push(store.name.clone());
        cities.push(store.city.clone());
        addresses.push(store.address.clone());
        zip_codes.push(store.zip_code);
    }

    let result = sqlx::query(
        "INSERT INTO stores \
             (chain_id, sub_chain_id, store_number, name, city, address, zip_code) \
         SELECT * FROM UNNEST(\
              $1::int8[], $2::int8[], $3::int8[], $4::text[], $5::text[], $6::text[], $7::int8[]) \
         ON CONFLICT (chain_id, sub_chain_id, store_number) DO NOTHING",
    )
    .bind(&chain_ids)
    .bind(&sub_chain_ids)
    .bind(&store_numbers)
    .bind(&names)
    .bind(&cities)
    .bind(&addresses)
    .bind(&zip_codes)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Lookups and city maintenance
// ---------------------------------------------------------------------------

/// Resolve a store's surrogate id from its natural key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_store_id(pool: &PgPool, id: StoreIdentifier) -> Result<Option<i64>, DbError> {
    let store_id = sqlx::query_scalar::<_, i64>(
        "SELECT store_id FROM stores \
         WHERE chain_id = $1 AND sub_chain_id = $2 AND store_number = $3",
    )
    .bind(id.chain_id)
    .bind(id.sub_chain_id)
    .bind(id.store_number)
    .fetch_optional(pool)
    .await?;

    Ok(store_id)
}

/// Every store id with its stored city.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_store_cities(pool: &PgPool) -> Result<Vec<StoreCityRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreCityRow>(
        "SELECT store_id, city FROM stores ORDER BY store_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Overwrite the city of each `(store_id, city)` pair.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_store_cities(
    pool: &PgPool,
    updates: &[(i64, String)],
) -> Result<u64, DbError> {
    if updates.is_empty() {
        return Ok(0);
    }

    let store_ids: Vec<i64> = updates.iter().map(|(id, _)| *id).collect();
    let cities: Vec<&str> = updates.iter().map(|(_, city)| city.as_str()).collect();

    let result = sqlx::query(
        "UPDATE stores s SET city = u.city \
         FROM UNNEST($1::int8[], $2::text[]) AS u(store_id, city) \
         WHERE s.store_id = u.store_id",
    )
    .bind(&store_ids)
    .bind(&cities)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
