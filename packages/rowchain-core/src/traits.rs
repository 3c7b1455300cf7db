use crate::ctx::Ctx;
use crate::error::Result;
use crate::ids::Uid;
use crate::model::{ChildDraft, ChildRow, ChildTable, OrderedScope};

/// Store contract for ordered child-row collections.
///
/// This is the surface the service façade consumes and the conformance suite
/// is written against. Point operations mirror the prepared statements of the
/// backend; the list operations are multi-statement edits that each run in a
/// single transaction and leave the scope's linkage invariants intact on
/// commit.
///
/// Updates are scope-predicated: an id supplied with the wrong `example_id`
/// affects zero rows and is not an error. Reads of an absent or cross-scope
/// id are `NotFound`.
pub trait ChildStore {
    /// Insert an owner row so child foreign keys can reference it. Idempotent.
    fn ensure_example(&mut self, ctx: &Ctx, id: Uid) -> Result<()>;

    /// Delete an owner row; every child list of that example goes with it.
    fn delete_example(&mut self, ctx: &Ctx, id: Uid) -> Result<()>;

    /// Raw insert of a fully-formed row, pointers included. Fails with
    /// `Constraint` when a pointer references a nonexistent id or the id is
    /// taken.
    fn create(&mut self, ctx: &Ctx, table: ChildTable, row: &ChildRow) -> Result<()>;

    fn get(&self, ctx: &Ctx, table: ChildTable, id: Uid) -> Result<ChildRow>;

    /// Unordered scope scan.
    fn list_by_example(
        &self,
        ctx: &Ctx,
        table: ChildTable,
        example_id: Uid,
    ) -> Result<Vec<ChildRow>>;

    /// Ordered traversal of one scope in a single recursive query. A broken
    /// or partially-linked chain yields a short result, reported through
    /// [`OrderedScope::missing`] rather than as an error.
    fn list_ordered(&self, ctx: &Ctx, table: ChildTable, example_id: Uid) -> Result<OrderedScope>;

    /// Overwrite both pointers on `(id, example_id)`; returns rows affected.
    fn update_order(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        id: Uid,
        example_id: Uid,
        prev: Option<Uid>,
        next: Option<Uid>,
    ) -> Result<usize>;

    fn update_prev(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        id: Uid,
        example_id: Uid,
        prev: Option<Uid>,
    ) -> Result<usize>;

    fn update_next(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        id: Uid,
        example_id: Uid,
        next: Option<Uid>,
    ) -> Result<usize>;

    /// Edit the payload columns of `(draft.id, draft.example_id)` without
    /// touching linkage; returns rows affected.
    fn update_content(&mut self, ctx: &Ctx, table: ChildTable, draft: &ChildDraft)
        -> Result<usize>;

    /// Bare row delete. The schema nulls incoming pointers; neighbors are NOT
    /// relinked. Most callers want [`ChildStore::remove`].
    fn delete(&mut self, ctx: &Ctx, table: ChildTable, id: Uid) -> Result<()>;

    /// Insert at the tail of the scope's list.
    fn append(&mut self, ctx: &Ctx, table: ChildTable, draft: ChildDraft) -> Result<ChildRow>;

    fn insert_after(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        draft: ChildDraft,
        anchor: Uid,
    ) -> Result<ChildRow>;

    fn insert_before(
        &mut self,
        ctx: &Ctx,
        table: ChildTable,
        draft: ChildDraft,
        anchor: Uid,
    ) -> Result<ChildRow>;

    /// Unlink the row, delete it, and relink the surviving neighbors.
    fn remove(&mut self, ctx: &Ctx, table: ChildTable, id: Uid) -> Result<()>;

    /// Move a row to a zero-based position in its scope, clamped to the list
    /// length.
    fn move_to(&mut self, ctx: &Ctx, table: ChildTable, id: Uid, position: usize) -> Result<()>;

    /// Stitch every row of the scope into one chain in ascending id order.
    /// The upgrade path for pre-linkage rows; returns the number of rows
    /// linked.
    fn relink_scope(&mut self, ctx: &Ctx, table: ChildTable, example_id: Uid) -> Result<usize>;
}
