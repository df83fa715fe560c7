//! Item prices from price and price-full files.

use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use pricesync_core::PriceRecord;
use rust_decimal::Decimal;

use super::{open, parse_field, walk, Node};
use crate::error::FeedError;

/// Tried in order; the chains disagree on separators and seconds.
const PRICE_DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

#[derive(Default)]
struct PriceDraft {
    item_code: Option<String>,
    price: Option<Decimal>,
    is_active: Option<bool>,
    price_date: Option<NaiveDate>,
}

impl PriceDraft {
    fn finish(self) -> Option<PriceRecord> {
        Some(PriceRecord {
            item_code: self.item_code?,
            price: self.price?,
            is_active: self.is_active,
            price_date: self.price_date,
        })
    }
}

fn is_item_tag(tag: &str) -> bool {
    tag == "item" || tag == "product"
}

/// Date part of a `PriceUpdateDate` value, or `today` when no format fits.
#[must_use]
pub fn parse_price_date(text: &str, today: NaiveDate) -> NaiveDate {
    let text = text.trim();
    PRICE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map_or_else(
            || {
                tracing::debug!(value = text, "unrecognised price date, using today");
                today
            },
            |dt| dt.date(),
        )
}

/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened, [`FeedError::Xml`] if it
/// is not well-formed.
pub fn parse_price_file(path: &Path, today: NaiveDate) -> Result<Vec<PriceRecord>, FeedError> {
    parse_price_reader(open(path)?, today)
}

/// Parse every `<Item>`/`<Product>` price. Records missing an item code or a
/// valid price are dropped. `today` stands in for undecodable dates.
///
/// # Errors
///
/// [`FeedError::Xml`] if the document is not well-formed.
pub fn parse_price_reader<R: BufRead>(
    input: R,
    today: NaiveDate,
) -> Result<Vec<PriceRecord>, FeedError> {
    let mut prices = Vec::new();
    let mut current: Option<PriceDraft> = None;

    walk(input, |node| {
        match node {
            Node::Open(tag) if is_item_tag(tag) => current = Some(PriceDraft::default()),
            Node::Open(_) => {}
            Node::Close { tag, .. } if is_item_tag(tag) => {
                if let Some(draft) = current.take() {
                    match draft.finish() {
                        Some(price) => prices.push(price),
                        None => tracing::debug!("dropping price without item code or price"),
                    }
                }
            }
            Node::Close { tag, text } => {
                if let Some(draft) = current.as_mut() {
                    match tag {
                        "itemcode" if !text.is_empty() => draft.item_code = Some(text.to_owned()),
                        "itemstatus" => draft.is_active = Some(text.eq_ignore_ascii_case("true")),
                        "priceupdatedate" => draft.price_date = Some(parse_price_date(text, today)),
                        "itemprice" => draft.price = parse_field(tag, text),
                        _ => {}
                    }
                }
            }
        }
        ControlFlow::Continue(())
    })?;

    Ok(prices)
}
