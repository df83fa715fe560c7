//! Streaming parsers for the published XML feeds.
//!
//! Every parser is driven by [`walk`], which turns the `quick_xml` event
//! stream into open/close callbacks with lower-cased tag names and the
//! trimmed text accumulated since the element opened. Only the record being
//! built is held in memory.

pub mod chain;
pub mod item;
pub mod price;
pub mod store;
pub mod store_identifier;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;

/// One structural step of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Node<'a> {
    Open(&'a str),
    Close { tag: &'a str, text: &'a str },
}

/// Drive `visit` over every element of `input` until EOF or `Break`.
///
/// Tag names are local names, ASCII lower-cased. Text and CDATA are collected
/// from each opening tag and trimmed when the element closes.
///
/// # Errors
///
/// Returns [`FeedError::Xml`] on malformed XML, including mismatched end tags.
pub(crate) fn walk<R, F>(input: R, mut visit: F) -> Result<(), FeedError>
where
    R: BufRead,
    F: FnMut(Node<'_>) -> ControlFlow<()>,
{
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        let flow = match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                text.clear();
                let tag = tag_name(e.local_name().as_ref());
                visit(Node::Open(&tag))
            }
            Event::Empty(e) => {
                text.clear();
                let tag = tag_name(e.local_name().as_ref());
                match visit(Node::Open(&tag)) {
                    ControlFlow::Continue(()) => visit(Node::Close {
                        tag: &tag,
                        text: "",
                    }),
                    ControlFlow::Break(()) => ControlFlow::Break(()),
                }
            }
            Event::End(e) => {
                let tag = tag_name(e.local_name().as_ref());
                let flow = visit(Node::Close {
                    tag: &tag,
                    text: text.trim(),
                });
                text.clear();
                flow
            }
            Event::Text(e) => {
                text.push_str(&e.unescape()?);
                ControlFlow::Continue(())
            }
            Event::CData(e) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                ControlFlow::Continue(())
            }
            Event::Eof => break,
            _ => ControlFlow::Continue(()),
        };
        if flow.is_break() {
            break;
        }
        buf.clear();
    }
    Ok(())
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

pub(crate) fn open(path: &Path) -> Result<BufReader<File>, FeedError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| FeedError::io(path, e))
}

/// Parse a field value, logging and discarding it when malformed.
pub(crate) fn parse_field<T: FromStr>(tag: &str, text: &str) -> Option<T> {
    if text.is_empty() {
        return None;
    }
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(tag, value = text, "skipping malformed field");
            None
        }
    }
}

/// `Some(text)` unless it is empty.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_owned())
}
