//! Stores feed: `<Store>`/`<Branch>` records under chain-level ids.

use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::Path;

use pricesync_core::StoreRecord;

use super::{non_empty, open, parse_field, walk, Node};
use crate::error::FeedError;

#[derive(Default)]
struct StoreDraft {
    chain_id: Option<i64>,
    sub_chain_id: Option<i64>,
    store_number: Option<i64>,
    name: Option<String>,
    city: Option<String>,
    address: Option<String>,
    zip_code: Option<i64>,
}

impl StoreDraft {
    fn finish(self) -> Option<StoreRecord> {
        Some(StoreRecord {
            chain_id: self.chain_id,
            sub_chain_id: self.sub_chain_id,
            store_number: self.store_number?,
            name: self.name,
            city: self.city,
            address: self.address,
            zip_code: self.zip_code,
        })
    }
}

fn is_store_tag(tag: &str) -> bool {
    tag == "store" || tag == "branch"
}

/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened, [`FeedError::Xml`] if it
/// is not well-formed.
pub fn parse_store_file(path: &Path) -> Result<Vec<StoreRecord>, FeedError> {
    parse_store_reader(open(path)?)
}

/// Parse every store. Chain and sub-chain ids seen anywhere earlier in the
/// document apply to each store as it opens, and ids declared inside a store
/// also carry forward to later siblings. Records without a store id are
/// dropped.
///
/// # Errors
///
/// [`FeedError::Xml`] if the document is not well-formed.
pub fn parse_store_reader<R: BufRead>(input: R) -> Result<Vec<StoreRecord>, FeedError> {
    let mut stores = Vec::new();
    let mut chain_id: Option<i64> = None;
    let mut sub_chain_id: Option<i64> = None;
    let mut current: Option<StoreDraft> = None;

    walk(input, |node| {
        match node {
            Node::Open(tag) if is_store_tag(tag) => {
                current = Some(StoreDraft {
                    chain_id,
                    sub_chain_id,
                    ..StoreDraft::default()
                });
            }
            Node::Open(_) => {}
            Node::Close { tag, .. } if is_store_tag(tag) => {
                if let Some(draft) = current.take() {
                    match draft.finish() {
                        Some(store) => stores.push(store),
                        None => tracing::debug!("dropping store without StoreId"),
                    }
                }
            }
            Node::Close { tag, text } => match tag {
                "chainid" => {
                    chain_id = parse_field(tag, text);
                    if let Some(draft) = current.as_mut() {
                        draft.chain_id = chain_id;
                    }
                }
                "subchainid" => {
                    sub_chain_id = parse_field(tag, text);
                    if let Some(draft) = current.as_mut() {
                        draft.sub_chain_id = sub_chain_id;
                    }
                }
                _ => {
                    if let Some(draft) = current.as_mut() {
                        apply_store_field(draft, tag, text);
                    }
                }
            },
        }
        ControlFlow::Continue(())
    })?;

    Ok(stores)
}

fn apply_store_field(draft: &mut StoreDraft, tag: &str, text: &str) {
    match tag {
        "storeid" => draft.store_number = parse_field(tag, text),
        "storename" => {
            if let Some(name) = non_empty(text) {
                draft.name = Some(name);
            }
        }
        "city" => {
            if let Some(city) = non_empty(text) {
                draft.city = Some(city);
            }
        }
        "address" => {
            if let Some(address) = non_empty(text) {
                draft.address = Some(address);
            }
        }
        "zipcode" => {
            if let Some(zip) = parse_field(tag, text) {
                draft.zip_code = Some(zip);
            }
        }
        _ => {}
    }
}
