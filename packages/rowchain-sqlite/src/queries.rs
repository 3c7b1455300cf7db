//! The closed set of prepared operations the engine is built from.
//!
//! Every function takes `&Connection`, so the same bindings serve the raw
//! connection and a transaction handle (`Transaction` derefs to
//! `Connection`). Statements are cached per connection; the only text
//! variation is the table name, drawn from the fixed [`ChildTable`] set.
//!
//! Pointer updates are scope-predicated (`id` AND `example_id`): an id
//! supplied with the wrong scope affects zero rows, which callers treat as a
//! non-event. That predicate is the single defense against a caller holding a
//! stale id from another list.

use rowchain_core::{ChildDraft, ChildRow, ChildTable, Error, OrderedRow, OrderedScope, Result, Uid};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const CHILD_COLUMNS: &str = "id, example_id, key, value, description, enabled, delta_parent_id, prev, next";

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation => {
            Error::Constraint(e.to_string())
        }
        _ => Error::Storage(e.to_string()),
    }
}

fn uid_col(idx: usize, data: Vec<u8>) -> rusqlite::Result<Uid> {
    Uid::from_bytes(&data)
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, "id".to_string(), Type::Blob))
}

fn opt_uid_col(idx: usize, data: Option<Vec<u8>>) -> rusqlite::Result<Option<Uid>> {
    data.map(|d| uid_col(idx, d)).transpose()
}

fn row_to_child(row: &Row<'_>) -> rusqlite::Result<ChildRow> {
    Ok(ChildRow {
        id: uid_col(0, row.get(0)?)?,
        example_id: uid_col(1, row.get(1)?)?,
        key: row.get(2)?,
        value: row.get(3)?,
        description: row.get(4)?,
        enabled: row.get(5)?,
        delta_parent_id: opt_uid_col(6, row.get(6)?)?,
        prev: opt_uid_col(7, row.get(7)?)?,
        next: opt_uid_col(8, row.get(8)?)?,
    })
}

/// Insert one fully-formed row. The foreign keys reject pointers at
/// nonexistent ids, surfacing as `Constraint`.
pub fn create(conn: &Connection, table: ChildTable, row: &ChildRow) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} ({CHILD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.execute(params![
        row.id.as_bytes(),
        row.example_id.as_bytes(),
        row.key,
        row.value,
        row.description,
        row.enabled,
        row.delta_parent_id.as_ref().map(|u| u.as_bytes()),
        row.prev.as_ref().map(|u| u.as_bytes()),
        row.next.as_ref().map(|u| u.as_bytes()),
    ])
    .map_err(db_err)?;
    Ok(())
}

pub fn get(conn: &Connection, table: ChildTable, id: Uid) -> Result<ChildRow> {
    let sql = format!(
        "SELECT {CHILD_COLUMNS} FROM {} WHERE id = ?1",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.query_row(params![id.as_bytes()], row_to_child)
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| Error::NotFound(format!("{} row {:?}", table.table_name(), id)))
}

/// Unordered scope scan.
pub fn list_by_example(conn: &Connection, table: ChildTable, example_id: Uid) -> Result<Vec<ChildRow>> {
    let sql = format!(
        "SELECT {CHILD_COLUMNS} FROM {} WHERE example_id = ?1",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params![example_id.as_bytes()], row_to_child)
        .map_err(db_err)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(db_err)?);
    }
    Ok(out)
}

/// Scope ids in ascending byte order, the deterministic order the bulk
/// relink stitches in.
pub fn ids_by_example_sorted(conn: &Connection, table: ChildTable, example_id: Uid) -> Result<Vec<Uid>> {
    let sql = format!(
        "SELECT id FROM {} WHERE example_id = ?1 ORDER BY id ASC",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params![example_id.as_bytes()], |row| uid_col(0, row.get(0)?))
        .map_err(db_err)?;
    let mut out = Vec::new();
    for id in rows {
        out.push(id.map_err(db_err)?);
    }
    Ok(out)
}

pub fn count_by_example(conn: &Connection, table: ChildTable, example_id: Uid) -> Result<usize> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE example_id = ?1",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    let count: i64 = stmt
        .query_row(params![example_id.as_bytes()], |row| row.get(0))
        .map_err(db_err)?;
    Ok(count.max(0) as usize)
}

/// The scope row with `next IS NULL`. Healthy scopes have at most one; among
/// legacy unlinked rows one candidate is taken, unspecified which.
pub fn tail_of(conn: &Connection, table: ChildTable, example_id: Uid) -> Result<Option<Uid>> {
    probe(conn, table, example_id, "next")
}

/// The scope row with `prev IS NULL`.
pub fn head_of(conn: &Connection, table: ChildTable, example_id: Uid) -> Result<Option<Uid>> {
    probe(conn, table, example_id, "prev")
}

fn probe(conn: &Connection, table: ChildTable, example_id: Uid, column: &str) -> Result<Option<Uid>> {
    let sql = format!(
        "SELECT id FROM {} WHERE example_id = ?1 AND {column} IS NULL LIMIT 1",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.query_row(params![example_id.as_bytes()], |row| uid_col(0, row.get(0)?))
        .optional()
        .map_err(db_err)
}

/// Ordered traversal of one scope as a single recursive query.
///
/// The anchor is the scope's head (one candidate when legacy all-null rows
/// make it ambiguous); the recurrence follows `next` within the same scope,
/// counting a dense `position` from zero. Recursion is capped by the scope
/// count taken just before, so a cycle that should never exist still cannot
/// hang the query. Rows past a broken link stay invisible; the caller sees
/// the shortfall through [`OrderedScope::missing`].
pub fn list_ordered(conn: &Connection, table: ChildTable, example_id: Uid) -> Result<OrderedScope> {
    let scope_len = count_by_example(conn, table, example_id)?;
    if scope_len == 0 {
        return Ok(OrderedScope { rows: Vec::new(), scope_len });
    }

    let t = table.table_name();
    let sql = format!(
        "WITH RECURSIVE walk (id, example_id, delta_parent_id, key, enabled, description, value, prev, next, position) AS (
            SELECT c.id, c.example_id, c.delta_parent_id, c.key, c.enabled, c.description, c.value, c.prev, c.next, 0
              FROM {t} c
             WHERE c.id = (SELECT id FROM {t} WHERE example_id = ?1 AND prev IS NULL LIMIT 1)
            UNION ALL
            SELECT c.id, c.example_id, c.delta_parent_id, c.key, c.enabled, c.description, c.value, c.prev, c.next, walk.position + 1
              FROM {t} c
              JOIN walk ON c.id = walk.next AND c.example_id = walk.example_id
             WHERE walk.position + 1 < ?2
        )
        SELECT id, example_id, delta_parent_id, key, enabled, description, value, prev, next, position FROM walk ORDER BY position"
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params![example_id.as_bytes(), scope_len as i64], |row| {
            Ok(OrderedRow {
                position: row.get(9)?,
                row: ChildRow {
                    id: uid_col(0, row.get(0)?)?,
                    example_id: uid_col(1, row.get(1)?)?,
                    delta_parent_id: opt_uid_col(2, row.get(2)?)?,
                    key: row.get(3)?,
                    enabled: row.get(4)?,
                    description: row.get(5)?,
                    value: row.get(6)?,
                    prev: opt_uid_col(7, row.get(7)?)?,
                    next: opt_uid_col(8, row.get(8)?)?,
                },
            })
        })
        .map_err(db_err)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(db_err)?);
    }
    Ok(OrderedScope { rows: out, scope_len })
}

/// Overwrite both pointers on `(id, example_id)`; returns rows affected.
pub fn update_order(
    conn: &Connection,
    table: ChildTable,
    id: Uid,
    example_id: Uid,
    prev: Option<Uid>,
    next: Option<Uid>,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET prev = ?3, next = ?4 WHERE id = ?1 AND example_id = ?2",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.execute(params![
        id.as_bytes(),
        example_id.as_bytes(),
        prev.as_ref().map(|u| u.as_bytes()),
        next.as_ref().map(|u| u.as_bytes()),
    ])
    .map_err(db_err)
}

pub fn update_prev(
    conn: &Connection,
    table: ChildTable,
    id: Uid,
    example_id: Uid,
    prev: Option<Uid>,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET prev = ?3 WHERE id = ?1 AND example_id = ?2",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.execute(params![
        id.as_bytes(),
        example_id.as_bytes(),
        prev.as_ref().map(|u| u.as_bytes()),
    ])
    .map_err(db_err)
}

pub fn update_next(
    conn: &Connection,
    table: ChildTable,
    id: Uid,
    example_id: Uid,
    next: Option<Uid>,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET next = ?3 WHERE id = ?1 AND example_id = ?2",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.execute(params![
        id.as_bytes(),
        example_id.as_bytes(),
        next.as_ref().map(|u| u.as_bytes()),
    ])
    .map_err(db_err)
}

/// Edit payload columns without touching linkage; returns rows affected.
pub fn update_content(conn: &Connection, table: ChildTable, draft: &ChildDraft) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET key = ?3, value = ?4, description = ?5, enabled = ?6, delta_parent_id = ?7
          WHERE id = ?1 AND example_id = ?2",
        table.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.execute(params![
        draft.id.as_bytes(),
        draft.example_id.as_bytes(),
        draft.key,
        draft.value,
        draft.description,
        draft.enabled,
        draft.delta_parent_id.as_ref().map(|u| u.as_bytes()),
    ])
    .map_err(db_err)
}

/// Delete one row; incoming pointers are nulled by the schema. Returns rows
/// affected (zero when the id is absent).
pub fn delete(conn: &Connection, table: ChildTable, id: Uid) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.table_name());
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    stmt.execute(params![id.as_bytes()]).map_err(db_err)
}

/// Insert an owner row so child foreign keys can point at it. Idempotent.
pub fn ensure_example(conn: &Connection, id: Uid) -> Result<()> {
    let mut stmt = conn
        .prepare_cached("INSERT OR IGNORE INTO examples (id) VALUES (?1)")
        .map_err(db_err)?;
    stmt.execute(params![id.as_bytes()]).map_err(db_err)?;
    Ok(())
}

/// Delete an owner row; `ON DELETE CASCADE` removes its child lists.
pub fn delete_example(conn: &Connection, id: Uid) -> Result<()> {
    let mut stmt = conn
        .prepare_cached("DELETE FROM examples WHERE id = ?1")
        .map_err(db_err)?;
    stmt.execute(params![id.as_bytes()]).map_err(db_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    const TABLE: ChildTable = ChildTable::Headers;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        schema::ensure_schema(&conn).unwrap();
        conn
    }

    fn seeded(conn: &Connection, example: Uid, seq: u64) -> ChildRow {
        let row = ChildDraft::new(Uid::from_parts(9, seq), example, "k", "v").into_row(None, None);
        create(conn, TABLE, &row).unwrap();
        row
    }

    #[test]
    fn create_then_get_round_trips() {
        let conn = conn();
        let example = Uid::from_parts(1, 0);
        ensure_example(&conn, example).unwrap();
        let row = seeded(&conn, example, 1);
        assert_eq!(get(&conn, TABLE, row.id).unwrap(), row);
    }

    #[test]
    fn get_of_absent_id_is_not_found() {
        let conn = conn();
        assert!(matches!(
            get(&conn, TABLE, Uid::from_parts(9, 9)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_id_is_a_constraint_violation() {
        let conn = conn();
        let example = Uid::from_parts(1, 0);
        ensure_example(&conn, example).unwrap();
        let row = seeded(&conn, example, 1);
        assert!(matches!(create(&conn, TABLE, &row), Err(Error::Constraint(_))));
    }

    #[test]
    fn updates_with_a_foreign_scope_touch_nothing() {
        let conn = conn();
        let example = Uid::from_parts(1, 0);
        let other = Uid::from_parts(2, 0);
        ensure_example(&conn, example).unwrap();
        ensure_example(&conn, other).unwrap();
        let row = seeded(&conn, example, 1);

        assert_eq!(update_next(&conn, TABLE, row.id, other, None).unwrap(), 0);
        assert_eq!(
            update_order(&conn, TABLE, row.id, other, None, None).unwrap(),
            0
        );
        assert_eq!(get(&conn, TABLE, row.id).unwrap(), row);
    }

    #[test]
    fn deleting_a_row_nulls_incoming_pointers() {
        let conn = conn();
        let example = Uid::from_parts(1, 0);
        ensure_example(&conn, example).unwrap();
        let a = seeded(&conn, example, 1);
        let b = seeded(&conn, example, 2);
        update_order(&conn, TABLE, a.id, example, None, Some(b.id)).unwrap();
        update_order(&conn, TABLE, b.id, example, Some(a.id), None).unwrap();

        assert_eq!(delete(&conn, TABLE, b.id).unwrap(), 1);
        let a = get(&conn, TABLE, a.id).unwrap();
        assert_eq!(a.next, None, "ON DELETE SET NULL must clear the dangler");
    }

    #[test]
    fn head_and_tail_probes_find_the_chain_ends() {
        let conn = conn();
        let example = Uid::from_parts(1, 0);
        ensure_example(&conn, example).unwrap();
        assert_eq!(head_of(&conn, TABLE, example).unwrap(), None);
        assert_eq!(tail_of(&conn, TABLE, example).unwrap(), None);

        let a = seeded(&conn, example, 1);
        let b = seeded(&conn, example, 2);
        update_order(&conn, TABLE, a.id, example, None, Some(b.id)).unwrap();
        update_order(&conn, TABLE, b.id, example, Some(a.id), None).unwrap();

        assert_eq!(head_of(&conn, TABLE, example).unwrap(), Some(a.id));
        assert_eq!(tail_of(&conn, TABLE, example).unwrap(), Some(b.id));
    }

    #[test]
    fn ordered_view_of_an_empty_scope_is_empty() {
        let conn = conn();
        let scope = list_ordered(&conn, TABLE, Uid::from_parts(3, 0)).unwrap();
        assert!(scope.rows.is_empty());
        assert_eq!(scope.scope_len, 0);
    }
}
