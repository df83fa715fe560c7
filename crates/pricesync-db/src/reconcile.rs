//! Chunked reconciliation of an incoming batch against stored rows.
//!
//! The item, price, and store merges all share this routine: dedupe the
//! batch, look up what already exists one chunk at a time, and partition
//! each record into insert, update, or unchanged.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;

/// Partition of an incoming batch relative to storage.
#[derive(Debug)]
pub struct Reconciled<T> {
    /// Records whose key was not found.
    pub inserts: Vec<T>,
    /// Records whose key exists and for which `should_replace` held.
    pub updates: Vec<T>,
    /// Records whose key exists but were left as stored.
    pub unchanged: usize,
}

impl<T> Default for Reconciled<T> {
    fn default() -> Self {
        Self {
            inserts: Vec::new(),
            updates: Vec::new(),
            unchanged: 0,
        }
    }
}

/// Reconcile `incoming` against storage in chunks of `chunk_size` keys.
///
/// Duplicate keys within `incoming` are collapsed first; the first
/// occurrence wins. `fetch_existing` receives one chunk of keys and returns
/// the stored value for every key that exists. `should_replace` decides
/// whether an existing row is overwritten by the incoming record.
///
/// A `chunk_size` of zero is treated as one.
///
/// # Errors
///
/// Returns the first error produced by `fetch_existing`; chunks already
/// processed are discarded.
pub async fn reconcile_chunked<T, K, V, E, KeyFn, Fetch, Fut, Replace>(
    incoming: Vec<T>,
    chunk_size: usize,
    key_of: KeyFn,
    mut fetch_existing: Fetch,
    should_replace: Replace,
) -> Result<Reconciled<T>, E>
where
    K: Eq + Hash + Clone,
    KeyFn: Fn(&T) -> K,
    Fetch: FnMut(Vec<K>) -> Fut,
    Fut: Future<Output = Result<HashMap<K, V>, E>>,
    Replace: Fn(&V, &T) -> bool,
{
    let mut seen: HashSet<K> = HashSet::with_capacity(incoming.len());
    let deduped: Vec<T> = incoming
        .into_iter()
        .filter(|record| seen.insert(key_of(record)))
        .collect();

    let chunk_size = chunk_size.max(1);
    let mut result = Reconciled::default();
    let mut pending = deduped.into_iter().peekable();

    while pending.peek().is_some() {
        let chunk: Vec<T> = pending.by_ref().take(chunk_size).collect();
        let keys: Vec<K> = chunk.iter().map(&key_of).collect();
        let existing = fetch_existing(keys).await?;

        for record in chunk {
            match existing.get(&key_of(&record)) {
                None => result.inserts.push(record),
                Some(stored) if should_replace(stored, &record) => result.updates.push(record),
                Some(_) => result.unchanged += 1,
            }
        }
    }

    Ok(result)
}
