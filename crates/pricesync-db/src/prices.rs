//! Per-store prices and the derived item price range.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use pricesync_core::PriceRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::reconcile::reconcile_chunked;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `prices` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub item_code: String,
    pub store_id: i64,
    pub price: Decimal,
    pub is_active: Option<bool>,
    pub price_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of [`merge_prices`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceMergeSummary {
    pub inserted: u64,
    pub updated: u64,
    /// Incoming prices not newer than the stored row.
    pub stale: u64,
}

impl PriceMergeSummary {
    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: PriceMergeSummary) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.stale += other.stale;
    }
}

// ---------------------------------------------------------------------------
// Conflict rule
// ---------------------------------------------------------------------------

/// Whether an incoming price replaces the stored one.
///
/// A stored row without a date always accepts the incoming price. A dated
/// row only accepts a strictly later date; an undated incoming price never
/// replaces a dated one.
#[must_use]
pub fn price_update_applies(existing: Option<NaiveDate>, incoming: Option<NaiveDate>) -> bool {
    match (existing, incoming) {
        (None, _) => true,
        (Some(stored), Some(new)) => new > stored,
        (Some(_), None) => false,
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge the prices observed at one store into the `prices` table.
///
/// New `(item_code, store_id)` keys are inserted; existing keys are updated
/// only when [`price_update_applies`] holds. The same rule is repeated in
/// SQL so a concurrent writer can never regress a row. Duplicate item codes
/// in `prices` collapse to the first occurrence.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any lookup or write fails. Chunks written
/// before the failure stay committed.
pub async fn merge_prices(
    pool: &PgPool,
    store_id: i64,
    prices: Vec<PriceRecord>,
    chunk_size: usize,
) -> Result<PriceMergeSummary, DbError> {
    if prices.is_empty() {
        return Ok(PriceMergeSummary::default());
    }

    let reconciled = reconcile_chunked(
        prices,
        chunk_size,
        |price: &PriceRecord| price.item_code.clone(),
        |codes| stored_price_dates(pool, store_id, codes),
        |stored: &Option<NaiveDate>, incoming: &PriceRecord| {
            price_update_applies(*stored, incoming.price_date)
        },
    )
    .await?;

    let chunk_size = chunk_size.max(1);
    let mut summary = PriceMergeSummary {
        stale: reconciled.unchanged as u64,
        ..PriceMergeSummary::default()
    };

    for chunk in reconciled.inserts.chunks(chunk_size) {
        summary.inserted += insert_prices(pool, store_id, chunk).await?;
    }
    for chunk in reconciled.updates.chunks(chunk_size) {
        summary.updated += update_prices(pool, store_id, chunk).await?;
    }

    Ok(summary)
}

async fn stored_price_dates(
    pool: &PgPool,
    store_id: i64,
    codes: Vec<String>,
) -> Result<HashMap<String, Option<NaiveDate>>, DbError> {
    let rows: Vec<(String, Option<NaiveDate>)> = sqlx::query_as(
        "SELECT item_code, price_date FROM prices \
         WHERE store_id = $1 AND item_code = ANY($2)",
    )
    .bind(store_id)
    .bind(&codes)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

struct PriceColumns {
    codes: Vec<String>,
    prices: Vec<Decimal>,
    active: Vec<Option<bool>>,
    dates: Vec<Option<NaiveDate>>,
}

impl PriceColumns {
    fn from_records(records: &[PriceRecord]) -> Self {
        let mut columns = Self {
            codes: Vec::with_capacity(records.len()),
            prices: Vec::with_capacity(records.len()),
            active: Vec::with_capacity(records.len()),
            dates: Vec::with_capacity(records.len()),
        };
        for record in records {
            columns.codes.push(record.item_code.clone());
            columns.prices.push(record.price);
            columns.active.push(record.is_active);
            columns.dates.push(record.price_date);
        }
        columns
    }
}

async fn insert_prices(
    pool: &PgPool,
    store_id: i64,
    chunk: &[PriceRecord],
) -> Result<u64, DbError> {
    let columns = PriceColumns::from_records(chunk);

    let result = sqlx::query(
        "INSERT INTO prices (item_code, store_id, price, is_active, price_date) \
         SELECT u.item_code, $1, u.price, u.is_active, u.price_date \
         FROM UNNEST($2::text[], $3::numeric[], $4::bool[], $5::date[]) \
              AS u(item_code, price, is_active, price_date) \
         ON CONFLICT (item_code, store_id) DO UPDATE SET \
             price      = EXCLUDED.price, \
             is_active  = EXCLUDED.is_active, \
             price_date = EXCLUDED.price_date, \
             updated_at = NOW() \
         WHERE prices.price_date IS NULL \
            OR (EXCLUDED.price_date IS NOT NULL AND EXCLUDED.price_date > prices.price_date)",
    )
    .bind(store_id)
    .bind(&columns.codes)
    .bind(&columns.prices)
    .bind(&columns.active)
    .bind(&columns.dates)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

async fn update_prices(
    pool: &PgPool,
    store_id: i64,
    chunk: &[PriceRecord],
) -> Result<u64, DbError> {
    let columns = PriceColumns::from_records(chunk);

    let result = sqlx::query(
        "UPDATE prices p SET \
             price      = u.price, \
             is_active  = u.is_active, \
             price_date = u.price_date, \
             updated_at = NOW() \
         FROM UNNEST($2::text[], $3::numeric[], $4::bool[], $5::date[]) \
              AS u(item_code, price, is_active, price_date) \
         WHERE p.store_id = $1 \
           AND p.item_code = u.item_code \
           AND (p.price_date IS NULL \
                OR (u.price_date IS NOT NULL AND u.price_date > p.price_date))",
    )
    .bind(store_id)
    .bind(&columns.codes)
    .bind(&columns.prices)
    .bind(&columns.active)
    .bind(&columns.dates)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads and aggregates
// ---------------------------------------------------------------------------

/// Fetch the stored price of one item at one store.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_price(
    pool: &PgPool,
    item_code: &str,
    store_id: i64,
) -> Result<Option<PriceRow>, DbError> {
    let row = sqlx::query_as::<_, PriceRow>(
        "SELECT item_code, store_id, price, is_active, price_date, updated_at \
         FROM prices WHERE item_code = $1 AND store_id = $2",
    )
    .bind(item_code)
    .bind(store_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Recompute `lowest_price` and `highest_price` for every priced item.
///
/// Returns the number of item rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn recompute_price_range(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE items i SET \
             lowest_price  = agg.min_price, \
             highest_price = agg.max_price \
         FROM ( \
             SELECT item_code, MIN(price) AS min_price, MAX(price) AS max_price \
             FROM prices \
             GROUP BY item_code \
         ) agg \
         WHERE i.item_code = agg.item_code",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn undated_stored_row_accepts_anything() {
        assert!(price_update_applies(None, None));
        assert!(price_update_applies(None, date(2024, 1, 1)));
    }

    #[test]
    fn dated_row_requires_strictly_later_date() {
        assert!(price_update_applies(date(2024, 1, 1), date(2024, 1, 2)));
        assert!(!price_update_applies(date(2024, 1, 2), date(2024, 1, 2)));
        assert!(!price_update_applies(date(2024, 1, 2), date(2024, 1, 1)));
    }

    #[test]
    fn undated_incoming_never_replaces_dated_row() {
        assert!(!price_update_applies(date(2024, 1, 1), None));
    }

    #[test]
    fn summary_absorb_adds_counts() {
        let mut total = PriceMergeSummary {
            inserted: 1,
            updated: 2,
            stale: 3,
        };
        total.absorb(PriceMergeSummary {
            inserted: 10,
            updated: 20,
            stale: 30,
        });
        assert_eq!(
            total,
            PriceMergeSummary {
                inserted: 11,
                updated: 22,
                stale: 33,
            }
        );
    }
}
