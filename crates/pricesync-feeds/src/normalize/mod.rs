//! Pure value normalizers applied before records reach the database.

mod city;
mod country;
mod unit;

pub use city::normalize_city;
pub use country::normalize_country;
pub use unit::{normalize_unit_of_measure, normalize_unit_qty};

use pricesync_core::ItemRecord;

/// Normalize the unit and country fields of a parsed item.
#[must_use]
pub fn clean_item(mut item: ItemRecord) -> ItemRecord {
    item.unit_qty = item.unit_qty.as_deref().map(normalize_unit_qty);
    item.unit_of_measure = item.unit_of_measure.as_deref().map(normalize_unit_of_measure);
    item.manufacture_country = item.manufacture_country.as_deref().map(normalize_country);
    item
}
