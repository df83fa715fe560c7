//! Chains feed: one `<ChainId>`/`<ChainName>` scope with `<SubChain>` children.

use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::Path;

use pricesync_core::ChainRecord;

use super::{non_empty, open, parse_field, walk, Node};
use crate::error::FeedError;

#[derive(Default)]
struct SubChainDraft {
    sub_chain_id: Option<i64>,
    sub_chain_name: Option<String>,
}

/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened, [`FeedError::Xml`] if it
/// is not well-formed.
pub fn parse_chain_file(path: &Path) -> Result<Vec<ChainRecord>, FeedError> {
    parse_chain_reader(open(path)?)
}

/// Parse every sub-chain, each carrying the chain id and name in scope when
/// it closes. Sub-chains without a chain id or sub-chain id are dropped.
///
/// # Errors
///
/// [`FeedError::Xml`] if the document is not well-formed.
pub fn parse_chain_reader<R: BufRead>(input: R) -> Result<Vec<ChainRecord>, FeedError> {
    let mut chains = Vec::new();
    let mut chain_id: Option<i64> = None;
    let mut chain_name: Option<String> = None;
    let mut current: Option<SubChainDraft> = None;

    walk(input, |node| {
        match node {
            Node::Open("subchain") => current = Some(SubChainDraft::default()),
            Node::Open(_) => {}
            Node::Close { tag, text } => match tag {
                "chainid" => chain_id = parse_field(tag, text),
                "chainname" => chain_name = non_empty(text),
                "subchainid" => {
                    if let Some(draft) = current.as_mut() {
                        draft.sub_chain_id = parse_field(tag, text);
                    }
                }
                "subchainname" => {
                    if let Some(draft) = current.as_mut() {
                        draft.sub_chain_name = non_empty(text);
                    }
                }
                "subchain" => {
                    if let Some(draft) = current.take() {
                        match (chain_id, draft.sub_chain_id) {
                            (Some(chain_id), Some(sub_chain_id)) => chains.push(ChainRecord {
                                chain_id,
                                sub_chain_id,
                                chain_name: chain_name.clone(),
                                sub_chain_name: draft.sub_chain_name,
                            }),
                            _ => tracing::warn!("dropping sub-chain without chain or sub-chain id"),
                        }
                    }
                }
                _ => {}
            },
        }
        ControlFlow::Continue(())
    })?;

    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_chains_inherit_chain_scope() {
        let xml = r"<Root>
            <ChainId>7290058140886</ChainId>
            <ChainName>רמי לוי</ChainName>
            <SubChains>
              <SubChain><SubChainId>1</SubChainId><SubChainName>רמי לוי שיווק השקמה</SubChainName></SubChain>
              <SubChain><SubChainId>2</SubChainId></SubChain>
            </SubChains>
          </Root>";
        let chains = parse_chain_reader(xml.as_bytes()).expect("parse");
        assert_eq!(
            chains,
            vec![
                ChainRecord {
                    chain_id: 7_290_058_140_886,
                    sub_chain_id: 1,
                    chain_name: Some("רמי לוי".to_owned()),
                    sub_chain_name: Some("רמי לוי שיווק השקמה".to_owned()),
                },
                ChainRecord {
                    chain_id: 7_290_058_140_886,
                    sub_chain_id: 2,
                    chain_name: Some("רמי לוי".to_owned()),
                    sub_chain_name: None,
                },
            ]
        );
    }

    #[test]
    fn tags_match_case_insensitively() {
        let xml = "<root><CHAINID>1</CHAINID><subchain><subchainid>1</subchainid></subchain></root>";
        let chains = parse_chain_reader(xml.as_bytes()).expect("parse");
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].chain_id, 1);
    }

    #[test]
    fn sub_chain_without_id_is_dropped() {
        let xml = "<Root><ChainId>1</ChainId><SubChain><SubChainName>x</SubChainName></SubChain></Root>";
        assert!(parse_chain_reader(xml.as_bytes()).expect("parse").is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = parse_chain_file(Path::new("/nonexistent/chains.xml"));
        assert!(matches!(result, Err(FeedError::Io { .. })));
    }
}
