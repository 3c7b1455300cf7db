use rowchain_core::{ChildTable, Result};
use rusqlite::Connection;

use crate::queries::db_err;

/// DDL for one ordered-child table. All child tables share this layout; the
/// table name is the only variation, and it comes from the closed
/// [`ChildTable`] set because identifiers cannot be bound as parameters.
///
/// `ON DELETE CASCADE` removes a whole list with its owner example;
/// `ON DELETE SET NULL` clears incoming pointers when a row dies, leaving the
/// relink of the surviving neighbors to the list algebra. The composite
/// indexes keep head probes and traversal joins index-backed.
fn child_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id BLOB PRIMARY KEY,
            example_id BLOB NOT NULL REFERENCES examples(id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            enabled INTEGER NOT NULL DEFAULT 1,
            delta_parent_id BLOB,
            prev BLOB REFERENCES {table}(id) ON DELETE SET NULL,
            next BLOB REFERENCES {table}(id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_example ON {table}(example_id);
        CREATE INDEX IF NOT EXISTS idx_{table}_example_prev ON {table}(example_id, prev);
        CREATE INDEX IF NOT EXISTS idx_{table}_example_next ON {table}(example_id, next);
        "
    )
}

/// Apply the schema idempotently. Foreign keys must already be switched on
/// for the connection; [`crate::engine::SqliteEngine`] does both at open.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let mut sql = String::from(
        "CREATE TABLE IF NOT EXISTS examples (
            id BLOB PRIMARY KEY
        );
        ",
    );
    for table in ChildTable::ALL {
        sql.push_str(&child_ddl(table.table_name()));
    }
    conn.execute_batch(&sql).map_err(db_err)
}
