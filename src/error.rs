use std::error::Error;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An error related to storage operations (reads, writes, codecs).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Error from the embedded key-value engine.
    #[error(transparent)]
    Kv(#[from] sled::Error),
    /// Data read back from the store does not satisfy the invariants the
    /// writer is supposed to maintain.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
    /// [`crate::Store::open`] was called with `create: true` but a store
    /// already exists at this path.
    #[error("a store already exists at {0}")]
    AlreadyExists(PathBuf),
    #[doc(hidden)]
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<StorageError> for io::Error {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::Kv(error) => Self::new(io::ErrorKind::Other, error),
            StorageError::Corruption(error) => error.into(),
            StorageError::AlreadyExists(path) => Self::new(
                io::ErrorKind::AlreadyExists,
                format!("a store already exists at {}", path.display()),
            ),
            StorageError::Other(error) => Self::new(io::ErrorKind::Other, error),
        }
    }
}

/// Structural corruption: a term or key read back from the key-value engine
/// does not satisfy the dictionary's or the codec's invariants.
#[derive(Debug, Error)]
pub enum CorruptionError {
    /// The term codec encountered a tag byte it does not know, or a
    /// malformed datatype/language payload.
    #[error("malformed term: {0}")]
    MalformedTerm(String),
    /// A term id referenced by an index row has no corresponding entry in
    /// `i2k` — the dictionary is supposed to be append-only and bijective,
    /// so this indicates the on-disk state has been corrupted or edited
    /// outside of this crate.
    #[error("dangling term id: {0}")]
    DanglingId(String),
    /// An index key did not split into the expected number of `^`-separated
    /// fields.
    #[error("malformed key: {0}")]
    MalformedKey(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl CorruptionError {
    pub(crate) fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

impl From<CorruptionError> for io::Error {
    fn from(error: CorruptionError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}
