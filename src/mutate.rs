//! Mutation Engine: `add`, `remove` (its four cases), and the internal
//! `remove_quad` helper they share. Operates purely at the term-id level —
//! resolving [`crate::term::Term`]s to ids is the caller's (`Store`'s) job.

use crate::error::StorageError;
use crate::index::IndexSet;
use crate::key::TermId;
use crate::planner;
use crate::scan::{self, ScanRow};

/// `add((s,p,o), context, quoted)` — spec.md §4.5.
///
/// A quad already present in CSPO under `context` is a no-op (idempotent
/// add, property P5).
pub fn add(
    indexes: &IndexSet,
    spo: [TermId; 3],
    context: TermId,
    quoted: bool,
) -> Result<(), StorageError> {
    if indexes.contains(spo, context)? {
        return Ok(());
    }
    indexes.mark_context_known(context)?;

    let mut contexts = indexes.conjunctive_contexts(spo)?;
    if !contexts.contains(&context) {
        contexts.push(context);
    }

    indexes.put_row(spo, context)?;
    if !quoted {
        indexes.put_conjunctive(spo, &contexts)?;
    }
    tracing::debug!(context = context.0, quoted, "added quad");
    Ok(())
}

/// Case A: all four of S, P, O, C are bound. Probes CSPO directly and, if
/// the quad exists, hands off to [`remove_quad`].
pub fn remove_fully_specified(
    indexes: &IndexSet,
    spo: [TermId; 3],
    context: TermId,
) -> Result<(), StorageError> {
    if indexes.contains(spo, context)? {
        remove_quad(indexes, spo, context, false)?;
    }
    Ok(())
}

/// Case B: some of S/P/O unbound, C bound. The planner picks an index
/// narrowed to `context`; every matching row is removed via
/// [`remove_quad`] with `c' = context`.
///
/// Case D (pure context removal) is this with `bound = [None, None, None]`
/// plus clearing the contexts partition entry — see [`remove_context`].
pub fn remove_pattern(
    indexes: &IndexSet,
    bound: [Option<TermId>; 3],
    context: TermId,
) -> Result<(), StorageError> {
    let plan = planner::plan(bound, Some(context));
    let partition = indexes.partition(plan.index);
    let rows: Vec<ScanRow> = scan::scan(plan.index, partition, plan.prefix).collect::<Result<_, _>>()?;
    for row in rows {
        remove_quad(indexes, row.spo, context, false)?;
    }
    Ok(())
}

/// Case C: S/P/O partially (or not at all) bound, context unbound. The
/// planner is given `context = None`, which yields a prefix whose context
/// field is empty — matching only conjunctive rows, never per-context rows
/// (those always carry a non-empty context field). For each matching
/// conjunctive row, every asserting context plus the conjunctive row
/// itself is deleted.
pub fn remove_context_unbound(
    indexes: &IndexSet,
    bound: [Option<TermId>; 3],
) -> Result<(), StorageError> {
    let plan = planner::plan(bound, None);
    let partition = indexes.partition(plan.index);
    let rows: Vec<ScanRow> = scan::scan(plan.index, partition, plan.prefix).collect::<Result<_, _>>()?;
    for row in rows {
        for context in &row.contexts {
            indexes.delete_any(row.spo, Some(*context))?;
        }
        indexes.delete_any(row.spo, None)?;
    }
    Ok(())
}

/// Case D: S, P and O are all unbound and C is bound — removes every quad
/// asserted in `context` (case B over the whole context subspace) and then
/// forgets the context itself.
pub fn remove_context(indexes: &IndexSet, context: TermId) -> Result<(), StorageError> {
    remove_pattern(indexes, [None, None, None], context)?;
    indexes.forget_context(context)?;
    tracing::debug!(context = context.0, "removed context");
    Ok(())
}

/// Removes `(spo, context)` from the per-context rows of all three indexes
/// and, unless `quoted`, keeps the conjunctive row's contexts value in sync
/// (rewriting it if other contexts still assert the triple, deleting it
/// otherwise).
pub fn remove_quad(
    indexes: &IndexSet,
    spo: [TermId; 3],
    context: TermId,
    quoted: bool,
) -> Result<(), StorageError> {
    let mut contexts = indexes.conjunctive_contexts(spo)?;
    indexes.delete_row(spo, context)?;

    if quoted {
        return Ok(());
    }

    contexts.retain(|c| *c != context);
    if contexts.is_empty() {
        indexes.delete_conjunctive(spo)?;
    } else {
        indexes.put_conjunctive(spo, &contexts)?;
    }
    Ok(())
}
