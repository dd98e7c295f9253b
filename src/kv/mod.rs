//! The ordered embedded key-value engine this crate is layered on top of.
//!
//! Mirrors the `Storage`/`StorageKind` enum-dispatch pattern the teacher
//! crate uses to pick between RocksDB and an in-memory fallback: here the
//! two backends are `sled` (the real, persistent, ordered KV engine) and a
//! `BTreeMap`-backed in-process engine used for [`crate::Store::open_in_memory`]
//! and for fast unit tests.

mod memory_backend;

use crate::error::StorageError;
use std::path::Path;

/// A handle to the underlying key-value engine. Cheap to clone (it's a
/// handle, not the data).
#[derive(Clone)]
pub struct Kv {
    kind: KvKind,
}

#[derive(Clone)]
enum KvKind {
    Sled(sled::Db),
    Memory(memory_backend::MemoryEngine),
}

impl Kv {
    pub fn open_sled(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self {
            kind: KvKind::Sled(db),
        })
    }

    /// Opens the sled backend with an explicit page-cache budget, backing
    /// [`crate::StoreOptions::sled_cache_capacity_bytes`].
    pub fn open_sled_with_capacity(path: &Path, cache_capacity_bytes: u64) -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(cache_capacity_bytes)
            .open()?;
        Ok(Self {
            kind: KvKind::Sled(db),
        })
    }

    pub fn open_in_memory() -> Self {
        Self {
            kind: KvKind::Memory(memory_backend::MemoryEngine::new()),
        }
    }

    /// Opens (creating if needed) the namespaced partition with this exact
    /// name, matching the on-disk layout spec.md §6 names by the literal
    /// partition identifiers (`c^s^p^o^`, `contexts`, `k2i`, ...).
    pub fn partition(&self, name: &str) -> Result<Partition, StorageError> {
        Ok(match &self.kind {
            KvKind::Sled(db) => Partition {
                kind: PartitionKind::Sled(db.open_tree(name)?),
            },
            KvKind::Memory(engine) => Partition {
                kind: PartitionKind::Memory(engine.partition(name)),
            },
        })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        match &self.kind {
            KvKind::Sled(db) => {
                db.flush()?;
                Ok(())
            }
            KvKind::Memory(_) => Ok(()),
        }
    }
}

/// A namespaced sub-store: point get/put/delete plus ascending prefix-range
/// iteration. This is the entire surface spec.md requires of the external
/// KV engine.
#[derive(Clone)]
pub struct Partition {
    kind: PartitionKind,
}

#[derive(Clone)]
enum PartitionKind {
    Sled(sled::Tree),
    Memory(memory_backend::MemoryTree),
}

impl Partition {
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        match &self.kind {
            PartitionKind::Sled(tree) => Ok(tree.get(key)?.map(|v| v.to_vec())),
            PartitionKind::Memory(tree) => Ok(tree.get(key)),
        }
    }

    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        match &self.kind {
            PartitionKind::Sled(tree) => {
                tree.insert(key, value)?;
                Ok(())
            }
            PartitionKind::Memory(tree) => {
                tree.insert(key, value);
                Ok(())
            }
        }
    }

    pub fn remove(&self, key: &[u8]) -> Result<(), StorageError> {
        match &self.kind {
            PartitionKind::Sled(tree) => {
                tree.remove(key)?;
                Ok(())
            }
            PartitionKind::Memory(tree) => {
                tree.remove(key);
                Ok(())
            }
        }
    }

    /// Ascending iteration over every `(key, value)` pair whose key starts
    /// with `prefix`. The iterator is not tied to `&self`: it owns a cheap
    /// clone of the underlying handle, matching §4.6's "every call creates
    /// a fresh iterator" restart semantics.
    pub fn scan_prefix(&self, prefix: &[u8]) -> PartitionIter {
        match &self.kind {
            PartitionKind::Sled(tree) => PartitionIter::Sled(tree.scan_prefix(prefix)),
            PartitionKind::Memory(tree) => PartitionIter::Memory(tree.scan_prefix(prefix)),
        }
    }
}

pub enum PartitionIter {
    Sled(sled::Iter),
    Memory(memory_backend::MemoryIter),
}

impl Iterator for PartitionIter {
    type Item = Result<(Vec<u8>, Vec<u8>), StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Sled(iter) => iter
                .next()
                .map(|r| r.map(|(k, v)| (k.to_vec(), v.to_vec())).map_err(Into::into)),
            Self::Memory(iter) => iter.next().map(Ok),
        }
    }
}
