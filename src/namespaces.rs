//! Namespaces: prefix/IRI binding, kept mutually consistent across two
//! partitions (`prefix` and `namespace`, named after the on-disk layout in
//! spec.md §6) so lookups run in either direction without a scan.

use crate::error::StorageError;
use crate::kv::{Kv, Partition};

pub struct Namespaces {
    /// prefix -> iri
    prefix_to_iri: Partition,
    /// iri -> prefix
    iri_to_prefix: Partition,
}

impl Namespaces {
    pub fn open(kv: &Kv) -> Result<Self, StorageError> {
        Ok(Self {
            prefix_to_iri: kv.partition("prefix")?,
            iri_to_prefix: kv.partition("namespace")?,
        })
    }

    /// Binds `prefix` to `iri`. If `iri` is already bound under a different
    /// prefix, that old prefix's entry is removed first. Rebinding `prefix`
    /// itself to a new `iri` does not clear the stale reverse entry for the
    /// old iri (matches `rdflib_leveldb.leveldbstore.Store.bind`, which only
    /// checks the iri -> prefix direction).
    pub fn bind(&self, prefix: &str, iri: &str) -> Result<(), StorageError> {
        if let Some(old_prefix) = self.iri_to_prefix.get(iri.as_bytes())? {
            self.prefix_to_iri.remove(&old_prefix)?;
        }
        self.prefix_to_iri.insert(prefix.as_bytes(), iri.as_bytes())?;
        self.iri_to_prefix.insert(iri.as_bytes(), prefix.as_bytes())?;
        Ok(())
    }

    pub fn namespace(&self, prefix: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .prefix_to_iri
            .get(prefix.as_bytes())?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    pub fn prefix(&self, iri: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .iri_to_prefix
            .get(iri.as_bytes())?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Result<(String, String), StorageError>> + '_ {
        self.prefix_to_iri.scan_prefix(b"").map(|row| {
            let (prefix, iri) = row?;
            Ok((
                String::from_utf8_lossy(&prefix).into_owned(),
                String::from_utf8_lossy(&iri).into_owned(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_lookup_both_directions() {
        let ns = Namespaces::open(&Kv::open_in_memory()).unwrap();
        ns.bind("foaf", "http://xmlns.com/foaf/0.1/").unwrap();
        assert_eq!(
            ns.namespace("foaf").unwrap().as_deref(),
            Some("http://xmlns.com/foaf/0.1/")
        );
        assert_eq!(
            ns.prefix("http://xmlns.com/foaf/0.1/").unwrap().as_deref(),
            Some("foaf")
        );
    }

    #[test]
    fn rebinding_prefix_leaves_stale_reverse_entry_for_old_iri() {
        // Matches the ground truth's asymmetry: rebinding "ex" to a new iri
        // does not clear the old iri -> prefix entry, so it keeps resolving
        // to "ex" even though "ex" no longer maps back to it.
        let ns = Namespaces::open(&Kv::open_in_memory()).unwrap();
        ns.bind("ex", "http://example.com/a/").unwrap();
        ns.bind("ex", "http://example.com/b/").unwrap();
        assert_eq!(
            ns.namespace("ex").unwrap().as_deref(),
            Some("http://example.com/b/")
        );
        assert_eq!(
            ns.prefix("http://example.com/a/").unwrap().as_deref(),
            Some("ex")
        );
    }

    #[test]
    fn rebinding_iri_under_new_prefix_unbinds_old_prefix() {
        let ns = Namespaces::open(&Kv::open_in_memory()).unwrap();
        ns.bind("a", "http://example.com/x/").unwrap();
        ns.bind("b", "http://example.com/x/").unwrap();
        assert_eq!(ns.namespace("a").unwrap(), None);
        assert_eq!(
            ns.prefix("http://example.com/x/").unwrap().as_deref(),
            Some("b")
        );
    }

    #[test]
    fn namespaces_enumerates_all_bindings() {
        let ns = Namespaces::open(&Kv::open_in_memory()).unwrap();
        ns.bind("a", "http://example.com/a/").unwrap();
        ns.bind("b", "http://example.com/b/").unwrap();
        let mut all: Vec<_> = ns.namespaces().collect::<Result<_, _>>().unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                ("a".to_owned(), "http://example.com/a/".to_owned()),
                ("b".to_owned(), "http://example.com/b/".to_owned()),
            ]
        );
    }
}
