//! List algebra: multi-statement edits over the embedded linkage.
//!
//! Every function takes a [`Transaction`] so a half-applied edit can never be
//! observed from outside; the engine opens the transaction, runs one of
//! these, and commits. Each edit is a short sequence of the point-updates in
//! [`crate::queries`] and leaves the scope a well-linked list on commit.

use rowchain_core::{ChildDraft, ChildRow, ChildTable, Error, Result, Uid};
use rusqlite::Transaction;

use crate::queries;

/// Insert at the tail: the new row takes the current tail as `prev`, then the
/// old tail points forward at it. An empty scope makes the row head and tail
/// at once.
pub fn append(tx: &Transaction<'_>, table: ChildTable, draft: ChildDraft) -> Result<ChildRow> {
    let tail = queries::tail_of(tx, table, draft.example_id)?;
    let row = draft.into_row(tail, None);
    queries::create(tx, table, &row)?;
    if let Some(tail_id) = tail {
        queries::update_next(tx, table, tail_id, row.example_id, Some(row.id))?;
    }
    Ok(row)
}

/// Insert between the anchor and its successor.
pub fn insert_after(
    tx: &Transaction<'_>,
    table: ChildTable,
    draft: ChildDraft,
    anchor: Uid,
) -> Result<ChildRow> {
    let a = anchored(tx, table, anchor, draft.example_id)?;
    let row = draft.into_row(Some(a.id), a.next);
    queries::create(tx, table, &row)?;
    queries::update_next(tx, table, a.id, row.example_id, Some(row.id))?;
    if let Some(b) = a.next {
        queries::update_prev(tx, table, b, row.example_id, Some(row.id))?;
    }
    Ok(row)
}

/// Insert between the anchor and its predecessor.
pub fn insert_before(
    tx: &Transaction<'_>,
    table: ChildTable,
    draft: ChildDraft,
    anchor: Uid,
) -> Result<ChildRow> {
    let a = anchored(tx, table, anchor, draft.example_id)?;
    let row = draft.into_row(a.prev, Some(a.id));
    queries::create(tx, table, &row)?;
    queries::update_prev(tx, table, a.id, row.example_id, Some(row.id))?;
    if let Some(p) = a.prev {
        queries::update_next(tx, table, p, row.example_id, Some(row.id))?;
    }
    Ok(row)
}

/// Delete the row, then stitch its neighbors back together. The delete runs
/// first: the schema nulls the neighbors' dangling pointers, and the bridge
/// restores symmetry around the gap.
pub fn remove(tx: &Transaction<'_>, table: ChildTable, id: Uid) -> Result<()> {
    let row = queries::get(tx, table, id)?;
    queries::delete(tx, table, id)?;
    bridge_neighbors(tx, table, &row)
}

/// Move a row to a zero-based position in its scope, clamped to the list
/// length. Requires the scope's chain to be intact.
pub fn move_to(tx: &Transaction<'_>, table: ChildTable, id: Uid, position: usize) -> Result<()> {
    let row = queries::get(tx, table, id)?;
    let ordered = queries::list_ordered(tx, table, row.example_id)?;
    if !ordered.is_intact() {
        return Err(Error::Inconsistent(format!(
            "scope {:?} has {} unreachable rows; relink before moving",
            row.example_id,
            ordered.missing()
        )));
    }

    let mut rest = ordered.ids();
    let Some(current) = rest.iter().position(|&other| other == id) else {
        return Err(Error::Inconsistent(format!(
            "row {id:?} not reachable in its scope's ordered view"
        )));
    };
    rest.remove(current);
    let target = position.min(rest.len());
    if target == current {
        return Ok(());
    }

    let left = (target > 0).then(|| rest[target - 1]);
    let right = rest.get(target).copied();

    bridge_neighbors(tx, table, &row)?;
    queries::update_order(tx, table, id, row.example_id, left, right)?;
    if let Some(l) = left {
        queries::update_next(tx, table, l, row.example_id, Some(id))?;
    }
    if let Some(r) = right {
        queries::update_prev(tx, table, r, row.example_id, Some(id))?;
    }
    Ok(())
}

/// Stitch every row of the scope into one chain in ascending id order. Ids
/// are byte-comparable with an embedded creation time, so this recovers
/// creation order for pre-linkage rows. Also the repair path after a broken
/// chain.
pub fn relink_scope(tx: &Transaction<'_>, table: ChildTable, example_id: Uid) -> Result<usize> {
    let ids = queries::ids_by_example_sorted(tx, table, example_id)?;
    for (i, id) in ids.iter().enumerate() {
        let prev = (i > 0).then(|| ids[i - 1]);
        let next = ids.get(i + 1).copied();
        queries::update_order(tx, table, *id, example_id, prev, next)?;
    }
    Ok(ids.len())
}

fn anchored(
    tx: &Transaction<'_>,
    table: ChildTable,
    anchor: Uid,
    example_id: Uid,
) -> Result<ChildRow> {
    let a = queries::get(tx, table, anchor)?;
    if a.example_id != example_id {
        return Err(Error::NotFound(format!(
            "anchor {:?} is not in scope {:?}",
            anchor, example_id
        )));
    }
    Ok(a)
}

/// Point the removed (or detached) row's neighbors at each other.
fn bridge_neighbors(tx: &Transaction<'_>, table: ChildTable, row: &ChildRow) -> Result<()> {
    if let Some(p) = row.prev {
        queries::update_next(tx, table, p, row.example_id, row.next)?;
    }
    if let Some(n) = row.next {
        queries::update_prev(tx, table, n, row.example_id, row.prev)?;
    }
    Ok(())
}
