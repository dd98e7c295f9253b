//! Term Dictionary: the append-only bijective mapping between serialized
//! terms and compact, monotonically-assigned integer ids.

use crate::error::{CorruptionError, StorageError};
use crate::key::TermId;
use crate::kv::{Kv, Partition};
use crate::term::Term;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const NEXT_ID_KEY: &[u8] = b"__terms__";

/// `k2i`/`i2k` partitions plus the `next_id` counter, with a small bounded
/// LRU cache in front of both directions (misses fall through to the KV).
pub struct Dictionary {
    k2i: Partition,
    i2k: Partition,
    id_to_term: Mutex<LruCache<TermId, Term>>,
    key_to_id: Mutex<LruCache<Vec<u8>, TermId>>,
}

impl Dictionary {
    pub fn open(kv: &Kv, cache_capacity: usize) -> Result<Self, StorageError> {
        let capacity = NonZeroUsize::new(cache_capacity.max(1))
            .unwrap_or(NonZeroUsize::new(1).expect("1 is nonzero"));
        Ok(Self {
            k2i: kv.partition("k2i")?,
            i2k: kv.partition("i2k")?,
            id_to_term: Mutex::new(LruCache::new(capacity)),
            key_to_id: Mutex::new(LruCache::new(capacity)),
        })
    }

    fn next_id(&self) -> Result<u64, StorageError> {
        Ok(match self.k2i.get(NEXT_ID_KEY)? {
            Some(bytes) => {
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| StorageError::Corruption(CorruptionError::new(e)))?;
                text.parse::<u64>().map_err(|e| {
                    StorageError::Corruption(CorruptionError::new(e))
                })?
            }
            // Fresh store: no id has ever been issued yet.
            None => 1,
        })
    }

    /// Returns the id for `term`, assigning and persisting a new one if this
    /// is the first time it's been seen.
    pub fn to_id(&self, term: &Term) -> Result<TermId, StorageError> {
        let encoded = term.encode();
        if let Some(id) = self.key_to_id.lock().unwrap_or_else(|e| e.into_inner()).get(&encoded) {
            return Ok(*id);
        }
        if let Some(bytes) = self.k2i.get(&encoded)? {
            let id = parse_id(&bytes)?;
            self.cache(&encoded, id, term.clone());
            return Ok(id);
        }

        let id = TermId(self.next_id()?);
        let id_bytes = id.0.to_string().into_bytes();
        self.i2k.insert(&id_bytes, &encoded)?;
        self.k2i.insert(&encoded, &id_bytes)?;
        self.k2i.insert(NEXT_ID_KEY, (id.0 + 1).to_string().as_bytes())?;
        tracing::debug!(id = id.0, "assigned new term id");
        self.cache(&encoded, id, term.clone());
        Ok(id)
    }

    /// Looks `term` up without assigning it an id if it has never been
    /// seen — used by read-only queries (`triples`, `size`, `contexts`),
    /// which must treat an unknown term as "matches nothing" rather than
    /// minting a fresh id for it.
    pub fn lookup(&self, term: &Term) -> Result<Option<TermId>, StorageError> {
        let encoded = term.encode();
        if let Some(id) = self.key_to_id.lock().unwrap_or_else(|e| e.into_inner()).get(&encoded) {
            return Ok(Some(*id));
        }
        match self.k2i.get(&encoded)? {
            Some(bytes) => {
                let id = parse_id(&bytes)?;
                self.cache(&encoded, id, term.clone());
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Resolves `id` back to the term it was assigned to.
    pub fn from_id(&self, id: TermId) -> Result<Term, StorageError> {
        if let Some(term) = self.id_to_term.lock().unwrap_or_else(|e| e.into_inner()).get(&id) {
            return Ok(term.clone());
        }
        let id_bytes = id.0.to_string().into_bytes();
        let encoded = self.i2k.get(&id_bytes)?.ok_or_else(|| {
            StorageError::Corruption(CorruptionError::DanglingId(id.0.to_string()))
        })?;
        let term = Term::decode(&encoded)?;
        self.cache(&encoded, id, term.clone());
        Ok(term)
    }

    fn cache(&self, encoded: &[u8], id: TermId, term: Term) {
        self.id_to_term
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(id, term);
        self.key_to_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(encoded.to_vec(), id);
    }
}

fn parse_id(bytes: &[u8]) -> Result<TermId, StorageError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::Corruption(CorruptionError::new(e)))?;
    text.parse::<u64>()
        .map(TermId)
        .map_err(|e| StorageError::Corruption(CorruptionError::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary::open(&Kv::open_in_memory(), 16).unwrap()
    }

    #[test]
    fn assigns_monotonic_ids_and_is_bijective() {
        let d = dict();
        let a = Term::iri("http://example.com/a").unwrap();
        let b = Term::iri("http://example.com/b").unwrap();
        let id_a = d.to_id(&a).unwrap();
        let id_b = d.to_id(&b).unwrap();
        assert_eq!(id_a, TermId(1));
        assert_eq!(id_b, TermId(2));
        assert_eq!(d.from_id(id_a).unwrap(), a);
        assert_eq!(d.from_id(id_b).unwrap(), b);
    }

    #[test]
    fn same_term_returns_same_id() {
        let d = dict();
        let a = Term::iri("http://example.com/a").unwrap();
        let id1 = d.to_id(&a).unwrap();
        let id2 = d.to_id(&a).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn dangling_id_is_corruption() {
        let d = dict();
        let err = d.from_id(TermId(999)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Corruption(CorruptionError::DanglingId(_))
        ));
    }

    #[test]
    fn survives_reopen_with_same_backing_kv() {
        let kv = Kv::open_in_memory();
        let a = Term::iri("http://example.com/a").unwrap();
        {
            let d = Dictionary::open(&kv, 16).unwrap();
            d.to_id(&a).unwrap();
        }
        let d2 = Dictionary::open(&kv, 16).unwrap();
        let b = Term::iri("http://example.com/b").unwrap();
        let id_b = d2.to_id(&b).unwrap();
        assert_eq!(id_b, TermId(2), "next id must continue past what was already issued");
    }
}
