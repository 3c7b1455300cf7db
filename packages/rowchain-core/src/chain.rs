//! Storage-free linkage checks over a snapshot of one scope.
//!
//! The relational schema enforces referential existence but not symmetry,
//! head/tail uniqueness, or acyclicity; those are the algebra's duty. The
//! functions here verify them after the fact and are used by debug assertions
//! and the backend conformance suite.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::ids::Uid;
use crate::model::ChildRow;

/// Assert the full linkage invariant set over an unordered snapshot of one
/// scope: single scope, no self-links, no dangling pointers, pointer
/// symmetry, unique head and tail, and a head-to-tail walk covering every row
/// exactly once.
pub fn validate(rows: &[ChildRow]) -> Result<()> {
    sort_linked(rows).map(|_| ())
}

/// Walk the chain head-to-tail and return the rows in traversal order.
///
/// Fails with [`Error::Inconsistent`] when the snapshot does not form exactly
/// one well-linked list.
pub fn sort_linked(rows: &[ChildRow]) -> Result<Vec<ChildRow>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let scope = rows[0].example_id;
    let mut by_id: HashMap<Uid, &ChildRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        if row.example_id != scope {
            return Err(Error::Inconsistent(format!(
                "snapshot mixes scopes: {:?} and {:?}",
                scope, row.example_id
            )));
        }
        if row.prev == Some(row.id) || row.next == Some(row.id) {
            return Err(Error::Inconsistent(format!("row {:?} links to itself", row.id)));
        }
        if by_id.insert(row.id, row).is_some() {
            return Err(Error::Inconsistent(format!("duplicate row id {:?}", row.id)));
        }
    }

    let mut head: Option<&ChildRow> = None;
    let mut tail_count = 0usize;
    for row in rows {
        match row.prev {
            None => {
                if head.replace(row).is_some() {
                    return Err(Error::Inconsistent("multiple head rows in scope".into()));
                }
            }
            Some(p) => {
                let Some(prev_row) = by_id.get(&p) else {
                    return Err(Error::Inconsistent(format!(
                        "row {:?} has dangling prev {:?}",
                        row.id, p
                    )));
                };
                if prev_row.next != Some(row.id) {
                    return Err(Error::Inconsistent(format!(
                        "asymmetric link: {:?}.prev = {:?} but not mirrored",
                        row.id, p
                    )));
                }
            }
        }
        match row.next {
            None => tail_count += 1,
            Some(n) => {
                let Some(next_row) = by_id.get(&n) else {
                    return Err(Error::Inconsistent(format!(
                        "row {:?} has dangling next {:?}",
                        row.id, n
                    )));
                };
                if next_row.prev != Some(row.id) {
                    return Err(Error::Inconsistent(format!(
                        "asymmetric link: {:?}.next = {:?} but not mirrored",
                        row.id, n
                    )));
                }
            }
        }
    }

    let Some(head) = head else {
        return Err(Error::Inconsistent("no head row in scope".into()));
    };
    if tail_count != 1 {
        return Err(Error::Inconsistent(format!(
            "expected exactly one tail row, found {tail_count}"
        )));
    }

    let mut out = Vec::with_capacity(rows.len());
    let mut visited: HashSet<Uid> = HashSet::with_capacity(rows.len());
    let mut cursor = Some(head.id);
    while let Some(id) = cursor {
        if !visited.insert(id) {
            return Err(Error::Inconsistent(format!("cycle through row {id:?}")));
        }
        let row = by_id[&id];
        out.push(row.clone());
        cursor = row.next;
    }
    if out.len() != rows.len() {
        return Err(Error::Inconsistent(format!(
            "walk covered {} of {} rows",
            out.len(),
            rows.len()
        )));
    }
    Ok(out)
}
