use rowchain_core::{ChildDraft, ChildStore, ChildTable, Ctx, Error, Uid, UidGen};
use rowchain_sqlite::{list, SqliteEngine};

const TABLE: ChildTable = ChildTable::Headers;

fn setup() -> (SqliteEngine, UidGen, Uid) {
    let mut store = SqliteEngine::open_in_memory().unwrap();
    let mut gen = UidGen::new();
    let example = gen.mint();
    store.ensure_example(&Ctx::background(), example).unwrap();
    (store, gen, example)
}

fn header(gen: &mut UidGen, example: Uid, key: &str, value: &str) -> ChildDraft {
    ChildDraft::new(gen.mint(), example, key, value)
}

#[test]
fn appended_headers_read_back_in_creation_order() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    let a = store.append(&ctx, TABLE, header(&mut gen, example, "key", "X")).unwrap();
    let b = store.append(&ctx, TABLE, header(&mut gen, example, "key", "Y")).unwrap();
    let c = store.append(&ctx, TABLE, header(&mut gen, example, "key", "Z")).unwrap();

    let ordered = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert_eq!(ordered.ids(), vec![a.id, b.id, c.id]);
    let positions: Vec<i64> = ordered.rows.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    let a = store.get(&ctx, TABLE, a.id).unwrap();
    let b = store.get(&ctx, TABLE, b.id).unwrap();
    let c = store.get(&ctx, TABLE, c.id).unwrap();
    assert_eq!((a.prev, a.next), (None, Some(b.id)));
    assert_eq!((b.prev, b.next), (Some(a.id), Some(c.id)));
    assert_eq!((c.prev, c.next), (Some(b.id), None));
}

#[test]
fn deleting_the_middle_header_relinks_the_survivors() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    let a = store.append(&ctx, TABLE, header(&mut gen, example, "k", "a")).unwrap();
    let b = store.append(&ctx, TABLE, header(&mut gen, example, "k", "b")).unwrap();
    let c = store.append(&ctx, TABLE, header(&mut gen, example, "k", "c")).unwrap();

    store.remove(&ctx, TABLE, b.id).unwrap();

    let ordered = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert_eq!(ordered.ids(), vec![a.id, c.id]);
    assert_eq!(
        ordered.rows.iter().map(|r| r.position).collect::<Vec<_>>(),
        vec![0, 1]
    );
    let a = store.get(&ctx, TABLE, a.id).unwrap();
    let c = store.get(&ctx, TABLE, c.id).unwrap();
    assert_eq!(a.next, Some(c.id));
    assert_eq!(c.prev, Some(a.id));
}

#[test]
fn a_thousand_appends_traverse_in_one_query() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    for i in 0..1000 {
        store
            .append(&ctx, TABLE, header(&mut gen, example, &format!("k{i}"), "v"))
            .unwrap();
    }

    let ordered = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert!(ordered.is_intact());
    assert_eq!(ordered.rows.len(), 1000);
    for (i, row) in ordered.rows.iter().enumerate() {
        assert_eq!(row.position, i as i64);
        assert_eq!(row.row.key, format!("k{i}"));
    }
}

#[test]
fn scopes_stay_isolated_under_deletes() {
    let mut store = SqliteEngine::open_in_memory().unwrap();
    let mut gen = UidGen::new();
    let ctx = Ctx::background();
    let e1 = gen.mint();
    let e2 = gen.mint();
    store.ensure_example(&ctx, e1).unwrap();
    store.ensure_example(&ctx, e2).unwrap();

    let h1 = store.append(&ctx, TABLE, header(&mut gen, e1, "k", "one")).unwrap();
    let h2 = store.append(&ctx, TABLE, header(&mut gen, e2, "k", "two")).unwrap();

    assert_eq!(store.list_ordered(&ctx, TABLE, e1).unwrap().ids(), vec![h1.id]);
    assert_eq!(store.list_ordered(&ctx, TABLE, e2).unwrap().ids(), vec![h2.id]);

    store.remove(&ctx, TABLE, h1.id).unwrap();
    assert!(store.list_ordered(&ctx, TABLE, e1).unwrap().rows.is_empty());
    assert_eq!(store.list_ordered(&ctx, TABLE, e2).unwrap().ids(), vec![h2.id]);
}

#[test]
fn rolled_back_chain_leaves_no_trace() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    {
        let tx = store.transaction().unwrap();
        list::append(&tx, TABLE, header(&mut gen, example, "k", "a")).unwrap();
        list::append(&tx, TABLE, header(&mut gen, example, "k", "b")).unwrap();
        tx.rollback().unwrap();
    }

    assert!(store.list_by_example(&ctx, TABLE, example).unwrap().is_empty());
    assert!(store.list_ordered(&ctx, TABLE, example).unwrap().rows.is_empty());
}

#[test]
fn committed_chain_is_visible_in_order() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    let (a, b) = {
        let tx = store.transaction().unwrap();
        let a = list::append(&tx, TABLE, header(&mut gen, example, "k", "a")).unwrap();
        let b = list::append(&tx, TABLE, header(&mut gen, example, "k", "b")).unwrap();
        tx.commit().unwrap();
        (a, b)
    };

    let ordered = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert_eq!(ordered.ids(), vec![a.id, b.id]);
    assert_eq!(
        ordered.rows.iter().map(|r| r.position).collect::<Vec<_>>(),
        vec![0, 1]
    );
}

#[test]
fn dropping_a_transaction_rolls_back_like_rollback() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    {
        let tx = store.transaction().unwrap();
        list::append(&tx, TABLE, header(&mut gen, example, "k", "a")).unwrap();
        // Dropped without commit.
    }
    assert!(store.list_by_example(&ctx, TABLE, example).unwrap().is_empty());
}

#[test]
fn cancelled_context_blocks_edits_without_touching_the_store() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();
    let before = store.append(&ctx, TABLE, header(&mut gen, example, "k", "kept")).unwrap();

    let (cancelled, handle) = Ctx::cancellable();
    handle.cancel();
    let err = store
        .append(&cancelled, TABLE, header(&mut gen, example, "k", "lost"))
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let ordered = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert_eq!(ordered.ids(), vec![before.id]);
}

#[test]
fn bare_delete_leaves_a_gap_that_relink_repairs() {
    let (mut store, mut gen, example) = setup();
    let ctx = Ctx::background();

    let a = store.append(&ctx, TABLE, header(&mut gen, example, "k", "a")).unwrap();
    let b = store.append(&ctx, TABLE, header(&mut gen, example, "k", "b")).unwrap();
    let c = store.append(&ctx, TABLE, header(&mut gen, example, "k", "c")).unwrap();

    // Raw delete skips the neighbor bridge: the foreign keys null the
    // dangling pointers and the chain is left in two pieces.
    store.delete(&ctx, TABLE, b.id).unwrap();
    let a_row = store.get(&ctx, TABLE, a.id).unwrap();
    let c_row = store.get(&ctx, TABLE, c.id).unwrap();
    assert_eq!(a_row.next, None);
    assert_eq!(c_row.prev, None);

    let gapped = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert!(!gapped.is_intact());

    store.relink_scope(&ctx, TABLE, example).unwrap();
    let repaired = store.list_ordered(&ctx, TABLE, example).unwrap();
    assert!(repaired.is_intact());
    assert_eq!(repaired.ids(), vec![a.id, c.id]);

    assert!(matches!(
        store.delete(&ctx, TABLE, b.id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn inserting_relative_to_a_foreign_anchor_is_refused() {
    let mut store = SqliteEngine::open_in_memory().unwrap();
    let mut gen = UidGen::new();
    let ctx = Ctx::background();
    let e1 = gen.mint();
    let e2 = gen.mint();
    store.ensure_example(&ctx, e1).unwrap();
    store.ensure_example(&ctx, e2).unwrap();

    let anchor = store.append(&ctx, TABLE, header(&mut gen, e1, "k", "one")).unwrap();
    let err = store
        .insert_after(&ctx, TABLE, header(&mut gen, e2, "k", "two"), anchor.id)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(store.list_by_example(&ctx, TABLE, e2).unwrap().is_empty());
}
