//! The public `Store` API: lifecycle (`open`/`close`/`destroy`) and the
//! quad operations (`add`/`remove`/`triples`/`size`/`contexts`) and
//! namespace operations, wired on top of the dictionary, index set and
//! mutation/scan/planner engines.

use std::path::Path;

use crate::dictionary::Dictionary;
use crate::error::StorageError;
use crate::index::IndexSet;
use crate::key::TermId;
use crate::kv::Kv;
use crate::mutate;
use crate::namespaces::Namespaces;
use crate::planner;
use crate::scan;
use crate::term::Term;

/// Tunables for [`Store::open`] / [`Store::open_in_memory`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Capacity of the term dictionary's bidirectional LRU cache. Matches
    /// the original store's `@lru_cache(maxsize=5000)` default.
    pub dictionary_cache_capacity: usize,
    /// `sled`'s page-cache budget. Ignored by the in-memory backend.
    pub sled_cache_capacity_bytes: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            dictionary_cache_capacity: 5000,
            sled_cache_capacity_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// The result of [`Store::open`]: a store is data about the filesystem, not
/// a failure, the way `rdflib`'s `NO_STORE`/`VALID_STORE` sentinels are.
pub enum OpenOutcome {
    Valid(Store),
    Missing,
}

/// One matched triple plus the contexts it was found in. When the query's
/// context was bound, this is always the singleton `[context]`; when
/// unbound, it is the full asserting-context set read off the conjunctive
/// row (empty only for a quoted-only triple, which a context-unbound scan
/// never visits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadMatch {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub contexts: Vec<Term>,
}

/// A persistent, context-aware RDF quad store.
pub struct Store {
    kv: Kv,
    dictionary: Dictionary,
    indexes: IndexSet,
    namespaces: Namespaces,
}

impl Store {
    /// Opens the store at `path`. With `create = true`, refuses to
    /// overwrite a path that already exists. With `create = false`,
    /// returns [`OpenOutcome::Missing`] rather than an error when nothing
    /// is there yet.
    pub fn open(path: &Path, create: bool, options: StoreOptions) -> Result<OpenOutcome, StorageError> {
        let exists = path.exists();
        if create {
            if exists {
                return Err(StorageError::AlreadyExists(path.to_path_buf()));
            }
            std::fs::create_dir_all(path)?;
        } else if !exists {
            return Ok(OpenOutcome::Missing);
        }

        let kv = Kv::open_sled_with_capacity(path, options.sled_cache_capacity_bytes)?;
        let store = Self::from_kv(kv, options.dictionary_cache_capacity)?;
        tracing::info!(path = %path.display(), "opened store");
        Ok(OpenOutcome::Valid(store))
    }

    /// Opens an ephemeral, in-process store. Not part of spec.md's literal
    /// surface, but required by the test-tooling ambient layer (§2 #14) and
    /// grounded in `oxigraph::Store::new()`'s role as the no-filesystem
    /// entry point.
    pub fn open_in_memory(options: StoreOptions) -> Self {
        Self::from_kv(Kv::open_in_memory(), options.dictionary_cache_capacity)
            .expect("the in-memory backend's partitions cannot fail to open")
    }

    fn from_kv(kv: Kv, dictionary_cache_capacity: usize) -> Result<Self, StorageError> {
        let dictionary = Dictionary::open(&kv, dictionary_cache_capacity)?;
        let indexes = IndexSet::open(&kv)?;
        let namespaces = Namespaces::open(&kv)?;
        Ok(Self {
            kv,
            dictionary,
            indexes,
            namespaces,
        })
    }

    /// Releases the KV handle. Safe to call once; consuming `self` is how
    /// that's enforced at compile time.
    pub fn close(self) {
        if let Err(error) = self.kv.flush() {
            tracing::warn!(%error, "error flushing store on close");
        }
        tracing::info!("closed store");
    }

    /// Removes the entire directory tree at `path`. Must be called on a
    /// closed store (there is no open handle to race against here).
    pub fn destroy(path: &Path) -> Result<(), StorageError> {
        std::fs::remove_dir_all(path)?;
        Ok(())
    }

    /// Best-effort durability hint; does not guarantee cross-index
    /// atomicity (spec.md §5).
    pub fn flush(&self) -> Result<(), StorageError> {
        self.kv.flush()
    }

    /// `add((s,p,o), context, quoted)` — spec.md §4.5.
    pub fn add(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        context: &Term,
        quoted: bool,
    ) -> Result<(), StorageError> {
        let s = self.dictionary.to_id(subject)?;
        let p = self.dictionary.to_id(predicate)?;
        let o = self.dictionary.to_id(object)?;
        let c = self.dictionary.to_id(context)?;
        mutate::add(&self.indexes, [s, p, o], c, quoted)
    }

    /// `remove(pattern, context)` — dispatches to the four cases of
    /// spec.md §4.5 based on which of S/P/O/C are bound. A bound term that
    /// was never assigned an id can't match anything and is a no-op.
    pub fn remove(
        &self,
        pattern: (Option<&Term>, Option<&Term>, Option<&Term>),
        context: Option<&Term>,
    ) -> Result<(), StorageError> {
        let context_id = match context {
            Some(term) => match self.dictionary.lookup(term)? {
                Some(id) => Some(id),
                None => return Ok(()),
            },
            None => None,
        };
        let bound = match self.lookup_pattern(pattern)? {
            Some(bound) => bound,
            None => return Ok(()),
        };

        match (bound, context_id) {
            ([Some(s), Some(p), Some(o)], Some(c)) => {
                mutate::remove_fully_specified(&self.indexes, [s, p, o], c)
            }
            ([None, None, None], Some(c)) => mutate::remove_context(&self.indexes, c),
            (bound, Some(c)) => mutate::remove_pattern(&self.indexes, bound, c),
            (bound, None) => mutate::remove_context_unbound(&self.indexes, bound),
        }
    }

    /// Resolves each bound pattern position via [`Dictionary::lookup`].
    /// Returns `Ok(None)` if any bound term has never been assigned an id
    /// (so the pattern can match nothing).
    fn lookup_pattern(
        &self,
        pattern: (Option<&Term>, Option<&Term>, Option<&Term>),
    ) -> Result<Option<[Option<TermId>; 3]>, StorageError> {
        let mut bound = [None; 3];
        for (slot, term) in bound.iter_mut().zip([pattern.0, pattern.1, pattern.2]) {
            if let Some(term) = term {
                match self.dictionary.lookup(term)? {
                    Some(id) => *slot = Some(id),
                    None => return Ok(None),
                }
            }
        }
        Ok(Some(bound))
    }

    /// `triples(pattern, context)` — spec.md §4.6. Lazily decodes every
    /// matching row; a bound term never before seen yields an empty
    /// sequence rather than an error.
    pub fn triples<'a>(
        &'a self,
        pattern: (Option<&Term>, Option<&Term>, Option<&Term>),
        context: Option<&Term>,
    ) -> Result<Box<dyn Iterator<Item = Result<QuadMatch, StorageError>> + 'a>, StorageError> {
        let context_id = match context {
            Some(term) => match self.dictionary.lookup(term)? {
                Some(id) => Some(id),
                None => return Ok(Box::new(std::iter::empty())),
            },
            None => None,
        };
        let bound = match self.lookup_pattern(pattern)? {
            Some(bound) => bound,
            None => return Ok(Box::new(std::iter::empty())),
        };

        let plan = planner::plan(bound, context_id);
        let partition = self.indexes.partition(plan.index);
        let rows = scan::scan(plan.index, partition, plan.prefix);
        let dictionary = &self.dictionary;
        let bound_context = context.cloned();
        Ok(Box::new(rows.map(move |row| {
            let row = row?;
            let [s, p, o] = row.spo;
            let subject = dictionary.from_id(s)?;
            let predicate = dictionary.from_id(p)?;
            let object = dictionary.from_id(o)?;
            let contexts = match &bound_context {
                Some(term) => vec![term.clone()],
                None => row
                    .contexts
                    .into_iter()
                    .map(|id| dictionary.from_id(id))
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(QuadMatch {
                subject,
                predicate,
                object,
                contexts,
            })
        })))
    }

    /// `size(context)` — spec.md §4.8: linear prefix-scan count, no
    /// maintained counter.
    pub fn size(&self, context: Option<&Term>) -> Result<usize, StorageError> {
        let context_id = match context {
            Some(term) => match self.dictionary.lookup(term)? {
                Some(id) => Some(id),
                None => return Ok(0),
            },
            None => None,
        };
        let plan = planner::plan([None, None, None], context_id);
        let partition = self.indexes.partition(plan.index);
        let mut count = 0usize;
        for row in scan::scan(plan.index, partition, plan.prefix) {
            row?;
            count += 1;
        }
        Ok(count)
    }

    /// `contexts(triple)` — spec.md §4.7.
    pub fn contexts<'a>(
        &'a self,
        triple: Option<(&Term, &Term, &Term)>,
    ) -> Result<Box<dyn Iterator<Item = Result<Term, StorageError>> + 'a>, StorageError> {
        match triple {
            Some((s, p, o)) => {
                let Some(s) = self.dictionary.lookup(s)? else {
                    return Ok(Box::new(std::iter::empty()));
                };
                let Some(p) = self.dictionary.lookup(p)? else {
                    return Ok(Box::new(std::iter::empty()));
                };
                let Some(o) = self.dictionary.lookup(o)? else {
                    return Ok(Box::new(std::iter::empty()));
                };
                let contexts = self.indexes.conjunctive_contexts([s, p, o])?;
                let dictionary = &self.dictionary;
                Ok(Box::new(
                    contexts.into_iter().map(move |id| dictionary.from_id(id)),
                ))
            }
            None => {
                let dictionary = &self.dictionary;
                Ok(Box::new(self.indexes.known_contexts().map(move |id| {
                    let id = id?;
                    dictionary.from_id(id)
                })))
            }
        }
    }

    /// Creates `graph` with no triples if it doesn't already exist as a
    /// known context. Sugar grounded in `rdflib_leveldb`'s `add_graph`
    /// (see SPEC_FULL.md §3).
    pub fn add_graph(&self, graph: &Term) -> Result<(), StorageError> {
        let id = self.dictionary.to_id(graph)?;
        self.indexes.mark_context_known(id)
    }

    /// Removes every quad asserted in `graph` and forgets the context
    /// itself, same as `remove((None, None, None), Some(graph))`.
    pub fn remove_graph(&self, graph: &Term) -> Result<(), StorageError> {
        let Some(id) = self.dictionary.lookup(graph)? else {
            return Ok(());
        };
        mutate::remove_context(&self.indexes, id)
    }

    pub fn bind(&self, prefix: &str, iri: &str) -> Result<(), StorageError> {
        self.namespaces.bind(prefix, iri)
    }

    pub fn namespace(&self, prefix: &str) -> Result<Option<String>, StorageError> {
        self.namespaces.namespace(prefix)
    }

    pub fn prefix(&self, iri: &str) -> Result<Option<String>, StorageError> {
        self.namespaces.prefix(iri)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Result<(String, String), StorageError>> + '_ {
        self.namespaces.namespaces()
    }
}
