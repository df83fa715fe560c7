//! Item catalogue fields from price-full files.

use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::Path;

use pricesync_core::ItemRecord;

use super::{non_empty, open, parse_field, walk, Node};
use crate::error::FeedError;

fn is_item_tag(tag: &str) -> bool {
    tag == "item" || tag == "product"
}

/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened, [`FeedError::Xml`] if it
/// is not well-formed.
pub fn parse_item_file(path: &Path) -> Result<Vec<ItemRecord>, FeedError> {
    parse_item_reader(open(path)?)
}

/// Parse every `<Item>`/`<Product>`. Records without an item code are
/// dropped; empty fields stay `None`.
///
/// # Errors
///
/// [`FeedError::Xml`] if the document is not well-formed.
pub fn parse_item_reader<R: BufRead>(input: R) -> Result<Vec<ItemRecord>, FeedError> {
    let mut items = Vec::new();
    let mut current: Option<ItemRecord> = None;

    walk(input, |node| {
        match node {
            Node::Open(tag) if is_item_tag(tag) => current = Some(ItemRecord::default()),
            Node::Open(_) => {}
            Node::Close { tag, .. } if is_item_tag(tag) => {
                if let Some(item) = current.take() {
                    if item.item_code.is_empty() {
                        tracing::debug!("dropping item without ItemCode");
                    } else {
                        items.push(item);
                    }
                }
            }
            Node::Close { tag, text } => {
                if let Some(item) = current.as_mut() {
                    apply_item_field(item, tag, text);
                }
            }
        }
        ControlFlow::Continue(())
    })?;

    Ok(items)
}

fn apply_item_field(item: &mut ItemRecord, tag: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    match tag {
        "itemcode" => text.clone_into(&mut item.item_code),
        "itemname" => item.name = non_empty(text),
        "manufacturername" => item.manufacturer_name = non_empty(text),
        "manufacturecountry" => item.manufacture_country = non_empty(text),
        "manufactureritemdescription" => item.manufacturer_item_description = non_empty(text),
        "unitqty" => item.unit_qty = non_empty(text),
        "quantity" => {
            if let Some(quantity) = parse_field(tag, text) {
                item.quantity = Some(quantity);
            }
        }
        "unitofmeasure" => item.unit_of_measure = non_empty(text),
        "bisweighted" => item.is_weighted = Some(text != "0"),
        "qtyinpackage" => item.qty_in_package = non_empty(text),
        _ => {}
    }
}
