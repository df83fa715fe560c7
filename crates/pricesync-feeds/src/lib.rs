pub mod catalog;
pub mod error;
pub mod normalize;
pub mod parse;

pub use catalog::{
    read_category_rows, read_extra_catalog, read_rami_levi_catalog, read_shufersal_catalog,
    write_classifier_input, CatalogEntry, CategoryRow,
};
pub use error::FeedError;
pub use normalize::{
    clean_item, normalize_city, normalize_country, normalize_unit_of_measure, normalize_unit_qty,
};
pub use parse::chain::{parse_chain_file, parse_chain_reader};
pub use parse::item::{parse_item_file, parse_item_reader};
pub use parse::price::{parse_price_date, parse_price_file, parse_price_reader};
pub use parse::store::{parse_store_file, parse_store_reader};
pub use parse::store_identifier::{parse_store_identifier_file, parse_store_identifier_reader};
