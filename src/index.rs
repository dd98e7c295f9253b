//! Index Set: the three quad indexes (CSPO, CPOS, COSP) plus the contexts
//! partition, and the "contexts value" payload that records which contexts
//! assert a given triple.

use crate::error::StorageError;
use crate::key::{self, IndexKind, TermId, SEPARATOR};
use crate::kv::{Kv, Partition};

/// The three rotated quad-index partitions and the flat contexts set.
pub struct IndexSet {
    cspo: Partition,
    cpos: Partition,
    cosp: Partition,
    contexts: Partition,
}

impl IndexSet {
    pub fn open(kv: &Kv) -> Result<Self, StorageError> {
        Ok(Self {
            cspo: kv.partition(IndexKind::Cspo.partition_name())?,
            cpos: kv.partition(IndexKind::Cpos.partition_name())?,
            cosp: kv.partition(IndexKind::Cosp.partition_name())?,
            contexts: kv.partition("contexts")?,
        })
    }

    pub fn partition(&self, index: IndexKind) -> &Partition {
        match index {
            IndexKind::Cspo => &self.cspo,
            IndexKind::Cpos => &self.cpos,
            IndexKind::Cosp => &self.cosp,
        }
    }

    /// `true` if this exact (spo, context) row is already present in CSPO —
    /// the canonical index, per spec.md §9.
    pub fn contains(&self, spo: [TermId; 3], context: TermId) -> Result<bool, StorageError> {
        let key = key::to_key(IndexKind::Cspo, spo, Some(context));
        Ok(self.cspo.get(&key)?.is_some())
    }

    /// Writes an empty-value per-context row into all three indexes.
    pub fn put_row(&self, spo: [TermId; 3], context: TermId) -> Result<(), StorageError> {
        for index in IndexKind::ALL {
            let key = key::to_key(index, spo, Some(context));
            self.partition(index).insert(&key, b"")?;
        }
        Ok(())
    }

    /// Deletes the per-context row from all three indexes.
    pub fn delete_row(&self, spo: [TermId; 3], context: TermId) -> Result<(), StorageError> {
        for index in IndexKind::ALL {
            let key = key::to_key(index, spo, Some(context));
            self.partition(index).remove(&key)?;
        }
        Ok(())
    }

    /// Reads the conjunctive-row contexts value for `spo` (from CSPO, the
    /// canonical index), parsed into a set of context ids.
    pub fn conjunctive_contexts(&self, spo: [TermId; 3]) -> Result<Vec<TermId>, StorageError> {
        let key = key::to_key(IndexKind::Cspo, spo, None);
        match self.cspo.get(&key)? {
            Some(value) => parse_contexts_value(&value),
            None => Ok(Vec::new()),
        }
    }

    /// Writes the conjunctive row in all three indexes with the given
    /// contexts value.
    pub fn put_conjunctive(&self, spo: [TermId; 3], contexts: &[TermId]) -> Result<(), StorageError> {
        let value = serialize_contexts_value(contexts);
        for index in IndexKind::ALL {
            let key = key::to_key(index, spo, None);
            self.partition(index).insert(&key, &value)?;
        }
        Ok(())
    }

    /// Deletes the conjunctive row in all three indexes.
    pub fn delete_conjunctive(&self, spo: [TermId; 3]) -> Result<(), StorageError> {
        self.delete_any(spo, None)
    }

    /// Deletes the row for an arbitrary context (or the conjunctive row, if
    /// `context` is `None`) from all three indexes. This is the primitive
    /// case C of `remove` needs: it has to delete both per-context rows and
    /// the conjunctive row through the same loop, since both are just
    /// `to_key` with a different context field.
    pub fn delete_any(&self, spo: [TermId; 3], context: Option<TermId>) -> Result<(), StorageError> {
        for index in IndexKind::ALL {
            let key = key::to_key(index, spo, context);
            self.partition(index).remove(&key)?;
        }
        Ok(())
    }

    pub fn mark_context_known(&self, context: TermId) -> Result<(), StorageError> {
        self.contexts.insert(context.0.to_string().as_bytes(), b"")
    }

    pub fn forget_context(&self, context: TermId) -> Result<(), StorageError> {
        self.contexts.remove(context.0.to_string().as_bytes())
    }

    pub fn known_contexts(&self) -> impl Iterator<Item = Result<TermId, StorageError>> {
        self.contexts.scan_prefix(b"").map(|r| {
            r.and_then(|(k, _)| {
                std::str::from_utf8(&k)
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(TermId)
                    .ok_or_else(|| {
                        StorageError::Corruption(crate::error::CorruptionError::MalformedKey(
                            "non-decimal context id".to_owned(),
                        ))
                    })
            })
        })
    }
}

/// Parses a `^`-joined contexts value into the set of non-empty context ids.
pub fn parse_contexts_value(value: &[u8]) -> Result<Vec<TermId>, StorageError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(|&b| b == SEPARATOR)
        .filter(|field| !field.is_empty())
        .map(|field| {
            std::str::from_utf8(field)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(TermId)
                .ok_or_else(|| {
                    StorageError::Corruption(crate::error::CorruptionError::MalformedKey(
                        "non-decimal context id in contexts value".to_owned(),
                    ))
                })
        })
        .collect()
}

/// Serializes a set of context ids into the `^`-joined contexts value.
pub fn serialize_contexts_value(contexts: &[TermId]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (i, id) in contexts.iter().enumerate() {
        if i > 0 {
            buf.push(SEPARATOR);
        }
        buf.extend_from_slice(id.0.to_string().as_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_value_round_trips() {
        let contexts = vec![TermId(3), TermId(7), TermId(11)];
        let value = serialize_contexts_value(&contexts);
        assert_eq!(value, b"3^7^11");
        let parsed = parse_contexts_value(&value).unwrap();
        assert_eq!(parsed, contexts);
    }

    #[test]
    fn empty_contexts_value_parses_to_empty_set() {
        assert_eq!(parse_contexts_value(b"").unwrap(), Vec::<TermId>::new());
    }

    #[test]
    fn index_agreement_put_row_writes_all_three() {
        let kv = Kv::open_in_memory();
        let set = IndexSet::open(&kv).unwrap();
        let spo = [TermId(1), TermId(2), TermId(3)];
        set.put_row(spo, TermId(9)).unwrap();
        for index in IndexKind::ALL {
            let key = key::to_key(index, spo, Some(TermId(9)));
            assert!(set.partition(index).get(&key).unwrap().is_some());
        }
    }
}
