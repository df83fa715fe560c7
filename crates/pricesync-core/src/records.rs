//! Lightweight records produced by the feed parsers and consumed by the
//! merge services.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One chain/sub-chain pair from the chains feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub chain_id: i64,
    pub sub_chain_id: i64,
    pub chain_name: Option<String>,
    pub sub_chain_name: Option<String>,
}

/// Natural key of a store as it appears in a price feed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreIdentifier {
    pub chain_id: i64,
    pub sub_chain_id: i64,
    pub store_number: i64,
}

/// A store row from a stores feed.
///
/// Chain ids are carried from an outer scope of the document and may be
/// missing when the feed never declared them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreRecord {
    pub chain_id: Option<i64>,
    pub sub_chain_id: Option<i64>,
    pub store_number: i64,
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<i64>,
}

impl StoreRecord {
    /// The store's natural key, if both chain ids are known.
    #[must_use]
    pub fn identifier(&self) -> Option<StoreIdentifier> {
        Some(StoreIdentifier {
            chain_id: self.chain_id?,
            sub_chain_id: self.sub_chain_id?,
            store_number: self.store_number,
        })
    }
}

/// An item as described by a price-full feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemRecord {
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
}

/// One observed price of an item at the store named in the feed header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub item_code: String,
    pub price: Decimal,
    pub is_active: Option<bool>,
    pub price_date: Option<NaiveDate>,
}
