//! Header probe for price and price-full files.

use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::Path;

use pricesync_core::StoreIdentifier;

use super::{open, parse_field, walk, Node};
use crate::error::FeedError;

/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened, [`FeedError::Xml`] if the
/// header is not well-formed.
pub fn parse_store_identifier_file(path: &Path) -> Result<Option<StoreIdentifier>, FeedError> {
    parse_store_identifier_reader(open(path)?)
}

/// Read `ChainId`, `SubChainId` and `StoreId` from the file header, stopping
/// as soon as all three are known. `None` if the document lacks any of them.
///
/// # Errors
///
/// [`FeedError::Xml`] if the header is not well-formed.
pub fn parse_store_identifier_reader<R: BufRead>(
    input: R,
) -> Result<Option<StoreIdentifier>, FeedError> {
    let mut chain_id: Option<i64> = None;
    let mut sub_chain_id: Option<i64> = None;
    let mut store_number: Option<i64> = None;

    walk(input, |node| {
        if let Node::Close { tag, text } = node {
            match tag {
                "chainid" => chain_id = parse_field(tag, text),
                "subchainid" => sub_chain_id = parse_field(tag, text),
                "storeid" => store_number = parse_field(tag, text),
                _ => {}
            }
        }
        if chain_id.is_some() && sub_chain_id.is_some() && store_number.is_some() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;

    Ok(match (chain_id, sub_chain_id, store_number) {
        (Some(chain_id), Some(sub_chain_id), Some(store_number)) => Some(StoreIdentifier {
            chain_id,
            sub_chain_id,
            store_number,
        }),
        _ => None,
    })
}
