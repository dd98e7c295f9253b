//! A `BTreeMap`-backed in-process key-value engine.
//!
//! Trimmed-down counterpart to the teacher's `storage::memory::MemoryStorage`:
//! that type carries MVCC version ranges to support concurrent readers
//! during a writer transaction, which this crate does not need (spec.md §5
//! mandates a single-writer, non-transactional model). What's left is just
//! the ordered-map-per-partition shape, shared behind a lock so partition
//! handles stay cheap to clone.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct MemoryEngine {
    partitions: Arc<RwLock<std::collections::HashMap<String, MemoryTree>>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(&self, name: &str) -> MemoryTree {
        if let Some(tree) = self.partitions.read().unwrap_or_else(|e| e.into_inner()).get(name) {
            return tree.clone();
        }
        let mut partitions = self
            .partitions
            .write()
            .unwrap_or_else(|e| e.into_inner());
        partitions
            .entry(name.to_owned())
            .or_insert_with(MemoryTree::default)
            .clone()
    }
}

#[derive(Clone, Default)]
pub struct MemoryTree {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryTree {
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: &[u8], value: &[u8]) {
        self.data
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_vec(), value.to_vec());
    }

    pub fn remove(&self, key: &[u8]) {
        self.data.write().unwrap_or_else(|e| e.into_inner()).remove(key);
    }

    pub fn scan_prefix(&self, prefix: &[u8]) -> MemoryIter {
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self
            .data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MemoryIter {
            inner: snapshot.into_iter(),
        }
    }
}

pub struct MemoryIter {
    inner: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl Iterator for MemoryIter {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
