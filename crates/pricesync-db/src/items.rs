//! Database operations for the `items` catalog.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use pricesync_core::ItemRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::reconcile::reconcile_chunked;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub item_code: String,
    pub name: Option<String>,
    pub manufacturer_name: Option<String>,
    pub manufacture_country: Option<String>,
    pub manufacturer_item_description: Option<String>,
    pub unit_qty: Option<String>,
    pub quantity: Option<f64>,
    pub unit_of_measure: Option<String>,
    pub is_weighted: Option<bool>,
    pub qty_in_package: Option<String>,
    pub general_category: Option<String>,
    pub sub_category: Option<String>,
    pub specific_category: Option<String>,
    pub image_url: Option<String>,
    pub lowest_price: Option<Decimal>,
    pub highest_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemNameRow {
    pub item_code: String,
    pub name: Option<String>,
}

/// Category triple to write onto an existing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCategoryUpdate {
    pub item_code: String,
    pub general_category: String,
    pub sub_category: String,
    pub specific_category: String,
}

/// Image (and optionally a better display name) for an existing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemImageUpdate {
    pub item_code: String,
    /// `None` keeps the stored name.
    pub name: Option<String>,
    pub image_url: String,
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert items whose code is not yet in the catalog.
///
/// Existing items are left untouched, so calling this twice with the same
/// batch inserts nothing the second time. Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any lookup or insert fails.
pub async fn seed_items(
    pool: &PgPool,
    items: Vec<ItemRecord>,
    chunk_size: usize,
) -> Result<u64, DbError> {
    if items.is_empty() {
        return Ok(0);
    }

    let reconciled = reconcile_chunked(
        items,
        chunk_size,
        |item: &ItemRecord| item.item_code.clone(),
        |codes| async move {
            let found = existing_item_codes(pool, &codes).await?;
            Ok::<_, DbError>(found.into_iter().map(|code| (code, ())).collect::<HashMap<_, _>>())
        },
        |_: &(), _: &ItemRecord| false,
    )
    .await?;

    let mut inserted = 0u64;
    for chunk in reconciled.inserts.chunks(chunk_size.max(1)) {
        inserted += insert_items(pool, chunk).await?;
    }

    Ok(inserted)
}

/// The subset of `codes` present in the `items` table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn existing_item_codes(
    pool: &PgPool,
    codes: &[String],
) -> Result<HashSet<String>, DbError> {
    if codes.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<String> =
        sqlx::query_scalar::<_, String>("SELECT item_code FROM items WHERE item_code = ANY($1)")
            .bind(codes)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().collect())
}

async fn insert_items(pool: &PgPool, chunk: &[ItemRecord]) -> Result<u64, DbError> {
    let mut codes: Vec<String> = Vec::with_capacity(chunk.len());
    let mut names: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut manufacturers: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut countries: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut descriptions: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut unit_qtys: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut quantities: Vec<Option<f64>> = Vec::with_capacity(chunk.len());
    let mut units: Vec<Option<String>> = Vec::with_capacity(chunk.len());
    let mut weighted: Vec<Option<bool>> = Vec::with_capacity(chunk.len());
    let mut qty_in_packages: Vec<Option<String>> = Vec::with_capacity(chunk.len());

    for item in chunk {
        codes.push(item.item_code.clone());
        names.push(item.name.clone());
        manufacturers.push(item.manufacturer_name.clone());
        countries.push(item.manufacture_country.clone());
        descriptions.push(item.manufacturer_item_description.clone());
        unit_qtys.push(item.unit_qty.clone());
        quantities.push(item.quantity);
        units.push(item.unit_of_measure.clone());
        weighted.push(item.is_weighted);
        qty_in_packages.push(item.qty_in_package.clone());
    }

    let result = sqlx::query(
        "INSERT INTO items \
             (item_code, name, manufacturer_name, manufacture_country, \
              manufacturer_item_description, unit_qty, quantity, unit_of_measure, \
              is_weighted, qty_in_package) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], \
              $6::text[], $7::float8[], $8::text[], $9::bool[], $10::text[]) \
         ON CONFLICT (item_code) DO NOTHING",
    )
    .bind(&codes)
    .bind(&names)
    .bind(&manufacturers)
    .bind(&countries)
    .bind(&descriptions)
    .bind(&unit_qtys)
    .bind(&quantities)
    .bind(&units)
    .bind(&weighted)
    .bind(&qty_in_packages)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch one item by its code.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no item has the code, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_item(pool: &PgPool, item_code: &str) -> Result<ItemRow, DbError> {
    sqlx::query_as::<_, ItemRow>(
        "SELECT item_code, name, manufacturer_name, manufacture_country, \
                manufacturer_item_description, unit_qty, quantity, unit_of_measure, \
                is_weighted, qty_in_package, general_category, sub_category, \
                specific_category, image_url, lowest_price, highest_price, \
                created_at, updated_at \
         FROM items WHERE item_code = $1",
    )
    .bind(item_code)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Code and name of every item, ordered by code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_item_names(pool: &PgPool) -> Result<Vec<ItemNameRow>, DbError> {
    let rows = sqlx::query_as::<_, ItemNameRow>(
        "SELECT item_code, name FROM items ORDER BY item_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Items without an image URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items_missing_image(pool: &PgPool) -> Result<Vec<ItemNameRow>, DbError> {
    let rows = sqlx::query_as::<_, ItemNameRow>(
        "SELECT item_code, name FROM items \
         WHERE image_url IS NULL OR image_url = '' \
         ORDER BY item_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Enrichment writes
// ---------------------------------------------------------------------------

/// Write category triples onto existing items. Unknown codes are ignored.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn apply_item_categories(
    pool: &PgPool,
    updates: &[ItemCategoryUpdate],
) -> Result<u64, DbError> {
    if updates.is_empty() {
        return Ok(0);
    }

    let codes: Vec<&str> = updates.iter().map(|u| u.item_code.as_str()).collect();
    let generals: Vec<&str> = updates.iter().map(|u| u.general_category.as_str()).collect();
    let subs: Vec<&str> = updates.iter().map(|u| u.sub_category.as_str()).collect();
    let specifics: Vec<&str> = updates
        .iter()
        .map(|u| u.specific_category.as_str())
        .collect();

    let result = sqlx::query(
        "UPDATE items i SET \
             general_category  = u.general_category, \
             sub_category      = u.sub_category, \
             specific_category = u.specific_category, \
             updated_at        = NOW() \
         FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[]) \
              AS u(item_code, general_category, sub_category, specific_category) \
         WHERE i.item_code = u.item_code",
    )
    .bind(&codes)
    .bind(&generals)
    .bind(&subs)
    .bind(&specifics)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Write image URLs, and names where given, onto existing items.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_item_images(
    pool: &PgPool,
    updates: &[ItemImageUpdate],
) -> Result<u64, DbError> {
    if updates.is_empty() {
        return Ok(0);
    }

    let codes: Vec<&str> = updates.iter().map(|u| u.item_code.as_str()).collect();
    let names: Vec<Option<&str>> = updates.iter().map(|u| u.name.as_deref()).collect();
    let images: Vec<&str> = updates.iter().map(|u| u.image_url.as_str()).collect();

    let result = sqlx::query(
        "UPDATE items i SET \
             name       = COALESCE(u.name, i.name), \
             image_url  = u.image_url, \
             updated_at = NOW() \
         FROM UNNEST($1::text[], $2::text[], $3::text[]) AS u(item_code, name, image_url) \
         WHERE i.item_code = u.item_code",
    )
    .bind(&codes)
    .bind(&names)
    .bind(&images)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
