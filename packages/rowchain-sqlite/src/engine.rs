use std::path::Path;

use rowchain_core::{
    ChildDraft, ChildRow, ChildStore, ChildTable, Ctx, Error, OrderedScope, Result, Uid,
};
use rusqlite::{Connection, Transaction};
use tracing::{debug, warn};

use crate::queries::{self, db_err};
use crate::{list, schema};

/// SQLite-backed [`ChildStore`].
///
/// Owns one connection. Point operations run as single statements on it;
/// list edits open a transaction, apply their point-updates, and commit, so
/// the linkage is never observable half-changed. The context is checked at
/// statement boundaries; an error or cancellation mid-edit drops the
/// transaction, which rolls it back.
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // SQLite leaves foreign keys off per session unless told otherwise;
        // the linkage depends on them.
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Raw connection access for callers that compose their own reads.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction for hand-composed edits with the functions in
    /// [`crate::queries`] and [`crate::list`]. Dropping it without commit
    /// rolls back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn.transaction().map_err(db_err)
    }

    fn edit<T>(
        &mut self,
        ctx: &Ctx,
        apply: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        ctx.ensure_active()?;
        let tx = self.conn.transaction().map_err(db_err)?;
        let out = apply(&tx)?;
        ctx.ensure_active()?;
        tx.commit().map_err(db_err)?;
        Ok(out)
    }
}

impl ChildStore for SqliteEngine {
    fn ensure_example(&mut self, ctx: &Ctx, id: Uid) -> Result<()> {
        ctx.ensure_active()?;
        queries::ensure_example(&self.conn, id)
    }

    fn delete_example(&mut self, ctx: &Ctx, id: Uid) -> Result<()> {
        ctx.ensure_active()?;
        queries::delete_example(&self.conn, id)
    }

    fn create(&mut self, ctx: &Ctx, table: ChildTable, row: &ChildRow) -> Result<()> {
        ctx.ensure_active()?;
        queries::create(&self.conn, table, row)
    }

    fn get(&self, ctx: &Ctx, table: ChildTable, id: Uid) -> Result<ChildRow> {
        ctx.ensure_active()?;
        queries::get(&self.conn, table, id)
    }

    fn list_by_example(
        &self,
        ctx: &Ctx,
        table: ChildTable,
        example_id: Uid,
    ) -> Result<Vec<ChildRow>> {
        ctx.ensure_active()?;
        queries::list_by_example(&self.conn, table, example_id)
    }

    fn list_ordered(&self, ctx: &Ctx, table: ChildTable, example_id: Uid) -> Result<OrderedScope> {
        ctx.ensure_active()?;
        let scope = queries::list_ordered(&self.conn, table, example_id)?;
        if !scope.is_intact() {
            warn!(
                table = table.table_name(),
                missing = scope.missing(),
                total = scope.scope_len,
                "ordered view shorter than scope scan; chain needs relink"
            );
        }
        Ok(scope)
    }

    fn update_order(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        id: Uid,
        example_id: Uid,
        prev: Option<Uid>,
        next: Option<Uid>,
    ) -> Result<usize> {
        ctx.ensure_active()?;
        queries::update_order(&self.conn, table, id, example_id, prev, next)
    }

    fn update_prev(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        id: Uid,
        example_id: Uid,
        prev: Option<Uid>,
    ) -> Result<usize> {
        ctx.ensure_active()?;
        queries::update_prev(&self.conn, table, id, example_id, prev)
    }

    fn update_next(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        id: Uid,
        example_id: Uid,
        next: Option<Uid>,
    ) -> Result<usize> {
        ctx.ensure_active()?;
        queries::update_next(&self.conn, table, id, example_id, next)
    }

    fn update_content(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        draft: &ChildDraft,
    ) -> Result<usize> {
        ctx.ensure_active()?;
        queries::update_content(&self.conn, table, draft)
    }

    fn delete(&mut self, ctx: &Ctx, table: ChildTable, id: Uid) -> Result<()> {
        ctx.ensure_active()?;
        let affected = queries::delete(&self.conn, table, id)?;
        if affected == 0 {
            return Err(Error::NotFound(format!("{} row {:?}", table.table_name(), id)));
        }
        Ok(())
    }

    fn append(&mut self, ctx: &Ctx, table: ChildTable, draft: ChildDraft) -> Result<ChildRow> {
        self.edit(ctx, |tx| list::append(tx, table, draft))
    }

    fn insert_after(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        draft: ChildDraft,
        anchor: Uid,
    ) -> Result<ChildRow> {
        self.edit(ctx, |tx| list::insert_after(tx, table, draft, anchor))
    }

    fn insert_before(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        draft: ChildDraft,
        anchor: Uid,
    ) -> Result<ChildRow> {
        self.edit(ctx, |tx| list::insert_before(tx, table, draft, anchor))
    }

    fn remove(&mut self, ctx: &Ctx, table: ChildTable, id: Uid) -> Result<()> {
        self.edit(ctx, |tx| list::remove(tx, table, id))
    }

    fn move_to(&mut self, ctx: &Ctx, table: ChildTable, id: Uid, position: usize) -> Result<()> {
        self.edit(ctx, |tx| list::move_to(tx, table, id, position))
    }

    fn relink_scope(&mut self, ctx: &Ctx, table: ChildTable, example_id: Uid) -> Result<usize> {
        let linked = self.edit(ctx, |tx| list::relink_scope(tx, table, example_id))?;
        debug!(
            table = table.table_name(),
            rows = linked,
            "scope stitched into a single chain"
        );
        Ok(linked)
    }
}
