#![cfg(test)]
//! End-to-end scenarios from spec.md §8, run against both backends.

use quadstore::{OpenOutcome, Store, StoreOptions, Term};
use std::error::Error;
use tempfile::TempDir;

fn iri(s: &str) -> Term {
    Term::iri(s).unwrap()
}

/// Installs a `RUST_LOG`-driven fmt subscriber, the way `oxigraph`'s `cli`
/// binary wires one up for the library to log into — this crate itself
/// never installs a subscriber (see SPEC_FULL.md §2 #12).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn scenario_1_add_and_scan() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let store = Store::open_in_memory(StoreOptions::default());
    let michel = iri("http://example.com/michel");
    let likes = iri("http://example.com/likes");
    let pizza = iri("http://example.com/pizza");
    let cheese = iri("http://example.com/cheese");
    let g1 = iri("http://example.com/g1");

    store.add(&michel, &likes, &pizza, &g1, false)?;
    store.add(&michel, &likes, &cheese, &g1, false)?;

    assert_eq!(store.size(None)?, 2);
    let found: Vec<_> = store
        .triples((Some(&michel), None, None), Some(&g1))?
        .collect::<Result<_, _>>()?;
    assert_eq!(found.len(), 2);
    Ok(())
}

#[test]
fn scenario_2_object_only_pattern_picks_cosp() -> Result<(), Box<dyn Error>> {
    let store = Store::open_in_memory(StoreOptions::default());
    let michel = iri("http://example.com/michel");
    let likes = iri("http://example.com/likes");
    let cheese = iri("http://example.com/cheese");
    let g1 = iri("http://example.com/g1");
    store.add(&michel, &likes, &cheese, &g1, false)?;

    let found: Vec<_> = store
        .triples((None, None, Some(&cheese)), None)?
        .collect::<Result<_, _>>()?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].object, cheese);
    Ok(())
}

#[test]
fn scenario_3_conjunctive_visibility() -> Result<(), Box<dyn Error>> {
    let store = Store::open_in_memory(StoreOptions::default());
    let tarek = iri("http://example.com/tarek");
    let likes = iri("http://example.com/likes");
    let pizza = iri("http://example.com/pizza");
    let g1 = iri("http://example.com/g1");
    let g2 = iri("http://example.com/g2");

    store.add(&tarek, &likes, &pizza, &g1, false)?;
    store.add(&tarek, &likes, &pizza, &g2, false)?;

    assert_eq!(store.size(None)?, 1);
    assert_eq!(store.size(Some(&g1))?, 1);

    let found: Vec<_> = store
        .triples((Some(&tarek), Some(&likes), Some(&pizza)), None)?
        .collect::<Result<_, _>>()?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].contexts.len(), 2);
    assert!(found[0].contexts.contains(&g1));
    assert!(found[0].contexts.contains(&g2));
    Ok(())
}

#[test]
fn scenario_4_quoted_assertion_hidden_from_conjunctive_view() -> Result<(), Box<dyn Error>> {
    let store = Store::open_in_memory(StoreOptions::default());
    let a = iri("http://example.com/a");
    let b = iri("http://example.com/b");
    let c = iri("http://example.com/c");
    let g1 = iri("http://example.com/g1");
    store.add(&a, &b, &c, &g1, true)?;

    let in_context: Vec<_> = store
        .triples((Some(&a), Some(&b), Some(&c)), Some(&g1))?
        .collect::<Result<_, _>>()?;
    assert_eq!(in_context.len(), 1);

    let conjunctive: Vec<_> = store
        .triples((Some(&a), Some(&b), Some(&c)), None)?
        .collect::<Result<_, _>>()?;
    assert!(conjunctive.is_empty());
    Ok(())
}

#[test]
fn scenario_5_remove_from_one_context() -> Result<(), Box<dyn Error>> {
    let store = Store::open_in_memory(StoreOptions::default());
    let tarek = iri("http://example.com/tarek");
    let likes = iri("http://example.com/likes");
    let pizza = iri("http://example.com/pizza");
    let g1 = iri("http://example.com/g1");
    let g2 = iri("http://example.com/g2");
    store.add(&tarek, &likes, &pizza, &g1, false)?;
    store.add(&tarek, &likes, &pizza, &g2, false)?;

    store.remove((Some(&tarek), Some(&likes), Some(&pizza)), Some(&g1))?;

    let in_g1: Vec<_> = store
        .triples((None, None, None), Some(&g1))?
        .collect::<Result<_, _>>()?;
    assert!(in_g1.is_empty());
    let in_g2: Vec<_> = store
        .triples((None, None, None), Some(&g2))?
        .collect::<Result<_, _>>()?;
    assert_eq!(in_g2.len(), 1);

    let conjunctive_contexts: Vec<_> = store
        .contexts(Some((&tarek, &likes, &pizza)))?
        .collect::<Result<_, _>>()?;
    assert_eq!(conjunctive_contexts, vec![g2]);
    Ok(())
}

#[test]
fn scenario_6_close_reopen_preserves_size_and_id_monotonicity() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let a = iri("http://example.com/a");
    let b = iri("http://example.com/b");
    let c = iri("http://example.com/c");
    let d = iri("http://example.com/d");
    let g1 = iri("http://example.com/g1");

    {
        let store = match Store::open(dir.path(), false, StoreOptions::default())? {
            OpenOutcome::Missing => panic!("create=false but path pre-exists from TempDir"),
            OpenOutcome::Valid(store) => store,
        };
        store.add(&a, &b, &c, &g1, false)?;
        store.flush()?;
        store.close();
    }

    let store = match Store::open(dir.path(), false, StoreOptions::default())? {
        OpenOutcome::Missing => panic!("store should already exist"),
        OpenOutcome::Valid(store) => store,
    };
    assert_eq!(store.size(None)?, 1);

    // A fresh term must get an id that continues past what was already
    // assigned to a/b/c/g1 (ids 1..=4), not restart at 1.
    store.add(&a, &b, &d, &g1, false)?;
    assert_eq!(store.size(None)?, 2);

    let found: Vec<_> = store
        .triples((Some(&a), Some(&b), None), None)?
        .collect::<Result<_, _>>()?;
    assert_eq!(found.len(), 2);
    Ok(())
}

#[test]
fn open_missing_without_create_returns_missing() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let nonexistent = dir.path().join("does-not-exist-yet");
    match Store::open(&nonexistent, false, StoreOptions::default())? {
        OpenOutcome::Missing => {}
        OpenOutcome::Valid(_) => panic!("expected Missing"),
    }
    Ok(())
}

#[test]
fn open_with_create_refuses_to_overwrite_existing_path() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let err = Store::open(dir.path(), true, StoreOptions::default()).unwrap_err();
    assert!(matches!(err, quadstore::StorageError::AlreadyExists(_)));
    Ok(())
}
