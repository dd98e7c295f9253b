//! Scan Engine: a generic prefix-scan driver yielding decoded quad rows.
//!
//! Every call to [`scan`] creates a fresh iterator over the chosen index;
//! per spec.md §4.6 it is lazy, non-restartable, and tied to the state of
//! the partition at the moment of the call — nothing here supports resuming
//! a scan across a `close`.

use crate::error::StorageError;
use crate::index::parse_contexts_value;
use crate::key::{self, IndexKind, TermId};
use crate::kv::Partition;

/// One decoded index row: its (context, s, p, o) key plus the contexts
/// parsed out of its value (empty unless the matched row happens to be a
/// conjunctive row carrying a real contexts value — see spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRow {
    pub context: Option<TermId>,
    pub spo: [TermId; 3],
    pub contexts: Vec<TermId>,
}

/// Prefix-scans `partition` (which must be the partition for `index`)
/// starting at `prefix`, stopping at the first key that doesn't start with
/// it, and decoding every matching row.
pub fn scan(
    index: IndexKind,
    partition: &Partition,
    prefix: Vec<u8>,
) -> impl Iterator<Item = Result<ScanRow, StorageError>> {
    let prefix_for_filter = prefix.clone();
    partition
        .scan_prefix(&prefix)
        .take_while(move |row| match row {
            Ok((k, _)) => k.starts_with(&prefix_for_filter),
            Err(_) => true,
        })
        .map(move |row| {
            let (raw_key, raw_value) = row?;
            let (context, spo) = key::from_key(index, &raw_key)?;
            let contexts = parse_contexts_value(&raw_value)?;
            Ok(ScanRow {
                context,
                spo,
                contexts,
            })
        })
}
