#![forbid(unsafe_code)]
//! Backend-agnostic conformance suite for [`ChildStore`] implementations.
//!
//! Backends call [`run_conformance`] from their own test crates; every check
//! here is expressed purely through the store contract so a new backend gets
//! the full battery for free. Panics on failure, like any test helper.

use rowchain_core::chain;
use rowchain_core::{ChildDraft, ChildRow, ChildStore, ChildTable, Ctx, Error, Uid, UidGen};

/// Scope scan sorted by id, used to compare list states across edits.
pub fn snapshot<S: ChildStore>(store: &S, table: ChildTable, example: Uid) -> Vec<ChildRow> {
    let mut rows = store
        .list_by_example(&Ctx::background(), table, example)
        .expect("scope scan");
    rows.sort_by_key(|r| r.id);
    rows
}

/// Assert the scope is a well-linked list and that the ordered view agrees
/// with the scan: same rows, dense zero-based positions, traversal order
/// matching the pointer chain.
pub fn assert_scope_valid<S: ChildStore>(store: &S, table: ChildTable, example: Uid) {
    let ctx = Ctx::background();
    let scan = store.list_by_example(&ctx, table, example).expect("scope scan");
    chain::validate(&scan).expect("linkage invariants");

    let ordered = store.list_ordered(&ctx, table, example).expect("ordered view");
    assert!(
        ordered.is_intact(),
        "ordered view is missing {} of {} rows",
        ordered.missing(),
        ordered.scope_len
    );
    assert_eq!(ordered.scope_len, scan.len());

    let walked = chain::sort_linked(&scan).expect("chain walk");
    let walked_ids: Vec<Uid> = walked.iter().map(|r| r.id).collect();
    assert_eq!(ordered.ids(), walked_ids, "traversal order diverges from pointers");
    for (i, row) in ordered.rows.iter().enumerate() {
        assert_eq!(row.position, i as i64, "positions must be dense from zero");
    }
}

fn fresh_example<S: ChildStore>(store: &mut S, gen: &mut UidGen) -> Uid {
    let example = gen.mint();
    store
        .ensure_example(&Ctx::background(), example)
        .expect("create owner example");
    example
}

fn draft(gen: &mut UidGen, example: Uid, key: &str, value: &str) -> ChildDraft {
    ChildDraft::new(gen.mint(), example, key, value)
}

/// Run the whole battery against one backend and table.
pub fn run_conformance<S: ChildStore>(store: &mut S, table: ChildTable, gen: &mut UidGen) {
    append_builds_chain(store, table, gen);
    middle_delete_relinks_neighbors(store, table, gen);
    insert_then_remove_restores_list(store, table, gen);
    move_round_trips(store, table, gen);
    update_content_keeps_linkage(store, table, gen);
    cross_scope_updates_affect_zero_rows(store, table, gen);
    create_with_dangling_pointer_is_rejected(store, table, gen);
    scopes_are_isolated(store, table, gen);
    owner_delete_cascades(store, table, gen);
    legacy_rows_upgrade_via_relink(store, table, gen);
}

pub fn append_builds_chain<S: ChildStore>(store: &mut S, table: ChildTable, gen: &mut UidGen) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);

    let a = store.append(&ctx, table, draft(gen, example, "key", "X")).unwrap();
    let b = store.append(&ctx, table, draft(gen, example, "key", "Y")).unwrap();
    let c = store.append(&ctx, table, draft(gen, example, "key", "Z")).unwrap();
    assert_scope_valid(store, table, example);

    let ordered = store.list_ordered(&ctx, table, example).unwrap();
    assert_eq!(ordered.ids(), vec![a.id, b.id, c.id]);

    let a = store.get(&ctx, table, a.id).unwrap();
    let b = store.get(&ctx, table, b.id).unwrap();
    let c = store.get(&ctx, table, c.id).unwrap();
    assert_eq!((a.prev, a.next), (None, Some(b.id)));
    assert_eq!((b.prev, b.next), (Some(a.id), Some(c.id)));
    assert_eq!((c.prev, c.next), (Some(b.id), None));
}

pub fn middle_delete_relinks_neighbors<S: ChildStore>(
    store: &mut S,
    table: ChildTable,
    gen: &mut UidGen,
) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);

    let a = store.append(&ctx, table, draft(gen, example, "k", "a")).unwrap();
    let b = store.append(&ctx, table, draft(gen, example, "k", "b")).unwrap();
    let c = store.append(&ctx, table, draft(gen, example, "k", "c")).unwrap();

    store.remove(&ctx, table, b.id).unwrap();
    assert_scope_valid(store, table, example);
    assert!(matches!(store.get(&ctx, table, b.id), Err(Error::NotFound(_))));

    let ordered = store.list_ordered(&ctx, table, example).unwrap();
    assert_eq!(ordered.ids(), vec![a.id, c.id]);
    let a = store.get(&ctx, table, a.id).unwrap();
    let c = store.get(&ctx, table, c.id).unwrap();
    assert_eq!(a.next, Some(c.id));
    assert_eq!(c.prev, Some(a.id));
}

pub fn insert_then_remove_restores_list<S: ChildStore>(
    store: &mut S,
    table: ChildTable,
    gen: &mut UidGen,
) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);

    let a = store.append(&ctx, table, draft(gen, example, "k", "a")).unwrap();
    let _b = store.append(&ctx, table, draft(gen, example, "k", "b")).unwrap();
    let before = snapshot(store, table, example);

    // Append then remove.
    let h = store.append(&ctx, table, draft(gen, example, "k", "h")).unwrap();
    store.remove(&ctx, table, h.id).unwrap();
    assert_eq!(snapshot(store, table, example), before);
    assert_scope_valid(store, table, example);

    // Insert in the middle then remove.
    let h = store
        .insert_after(&ctx, table, draft(gen, example, "k", "h"), a.id)
        .unwrap();
    store.remove(&ctx, table, h.id).unwrap();
    assert_eq!(snapshot(store, table, example), before);

    // Insert at the head then remove.
    let h = store
        .insert_before(&ctx, table, draft(gen, example, "k", "h"), a.id)
        .unwrap();
    store.remove(&ctx, table, h.id).unwrap();
    assert_eq!(snapshot(store, table, example), before);
    assert_scope_valid(store, table, example);
}

pub fn move_round_trips<S: ChildStore>(store: &mut S, table: ChildTable, gen: &mut UidGen) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);

    let ids: Vec<Uid> = (0..4)
        .map(|i| {
            store
                .append(&ctx, table, draft(gen, example, "k", &format!("v{i}")))
                .unwrap()
                .id
        })
        .collect();
    let before = snapshot(store, table, example);

    store.move_to(&ctx, table, ids[2], 0).unwrap();
    assert_scope_valid(store, table, example);
    let ordered = store.list_ordered(&ctx, table, example).unwrap();
    assert_eq!(ordered.ids(), vec![ids[2], ids[0], ids[1], ids[3]]);

    store.move_to(&ctx, table, ids[2], 2).unwrap();
    assert_eq!(snapshot(store, table, example), before);

    // Moving to the current position commits a no-op.
    store.move_to(&ctx, table, ids[1], 1).unwrap();
    assert_eq!(snapshot(store, table, example), before);

    // Positions past the end clamp to the tail.
    store.move_to(&ctx, table, ids[0], 99).unwrap();
    let ordered = store.list_ordered(&ctx, table, example).unwrap();
    assert_eq!(ordered.ids(), vec![ids[1], ids[2], ids[3], ids[0]]);
    assert_scope_valid(store, table, example);
}

pub fn update_content_keeps_linkage<S: ChildStore>(
    store: &mut S,
    table: ChildTable,
    gen: &mut UidGen,
) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);

    let a = store.append(&ctx, table, draft(gen, example, "k", "a")).unwrap();
    let b = store.append(&ctx, table, draft(gen, example, "k", "b")).unwrap();

    let mut edit = ChildDraft::new(a.id, example, "renamed", "rewritten");
    edit.description = "and documented".into();
    edit.enabled = false;
    let affected = store.update_content(&ctx, table, &edit).unwrap();
    assert_eq!(affected, 1);

    let a = store.get(&ctx, table, a.id).unwrap();
    assert_eq!(a.key, "renamed");
    assert_eq!(a.value, "rewritten");
    assert!(!a.enabled);
    assert_eq!(a.next, Some(b.id), "content edits must not touch linkage");
    assert_scope_valid(store, table, example);
}

pub fn cross_scope_updates_affect_zero_rows<S: ChildStore>(
    store: &mut S,
    table: ChildTable,
    gen: &mut UidGen,
) {
    let ctx = Ctx::background();
    let e1 = fresh_example(store, gen);
    let e2 = fresh_example(store, gen);

    let h1 = store.append(&ctx, table, draft(gen, e1, "k", "one")).unwrap();
    let h2 = store.append(&ctx, table, draft(gen, e2, "k", "two")).unwrap();

    // A stale id from another list must neither error nor apply.
    assert_eq!(store.update_next(&ctx, table, h1.id, e2, None).unwrap(), 0);
    assert_eq!(store.update_prev(&ctx, table, h1.id, e2, Some(h2.id)).unwrap(), 0);
    assert_eq!(
        store.update_order(&ctx, table, h1.id, e2, None, None).unwrap(),
        0
    );
    let mut edit = ChildDraft::new(h1.id, e2, "stolen", "stolen");
    edit.enabled = false;
    assert_eq!(store.update_content(&ctx, table, &edit).unwrap(), 0);

    let h1 = store.get(&ctx, table, h1.id).unwrap();
    assert_eq!(h1.value, "one");
    assert_scope_valid(store, table, e1);
    assert_scope_valid(store, table, e2);
}

pub fn create_with_dangling_pointer_is_rejected<S: ChildStore>(
    store: &mut S,
    table: ChildTable,
    gen: &mut UidGen,
) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);
    let ghost = gen.mint();

    let row = draft(gen, example, "k", "v").into_row(Some(ghost), None);
    let id = row.id;
    assert!(matches!(
        store.create(&ctx, table, &row),
        Err(Error::Constraint(_))
    ));
    // The failed insert must leave no trace.
    assert!(matches!(store.get(&ctx, table, id), Err(Error::NotFound(_))));
    assert!(snapshot(store, table, example).is_empty());
}

pub fn scopes_are_isolated<S: ChildStore>(store: &mut S, table: ChildTable, gen: &mut UidGen) {
    let ctx = Ctx::background();
    let e1 = fresh_example(store, gen);
    let e2 = fresh_example(store, gen);

    let h1 = store.append(&ctx, table, draft(gen, e1, "k", "one")).unwrap();
    let h2 = store.append(&ctx, table, draft(gen, e2, "k", "two")).unwrap();

    assert_eq!(store.list_ordered(&ctx, table, e1).unwrap().ids(), vec![h1.id]);
    assert_eq!(store.list_ordered(&ctx, table, e2).unwrap().ids(), vec![h2.id]);

    store.remove(&ctx, table, h1.id).unwrap();
    let e2_view = store.list_ordered(&ctx, table, e2).unwrap();
    assert_eq!(e2_view.ids(), vec![h2.id]);
    assert!(store.list_ordered(&ctx, table, e1).unwrap().rows.is_empty());
}

pub fn owner_delete_cascades<S: ChildStore>(store: &mut S, table: ChildTable, gen: &mut UidGen) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);
    for i in 0..3 {
        store
            .append(&ctx, table, draft(gen, example, "k", &format!("v{i}")))
            .unwrap();
    }

    store.delete_example(&ctx, example).unwrap();
    assert!(store.list_by_example(&ctx, table, example).unwrap().is_empty());
    assert!(store.list_ordered(&ctx, table, example).unwrap().rows.is_empty());
}

pub fn legacy_rows_upgrade_via_relink<S: ChildStore>(
    store: &mut S,
    table: ChildTable,
    gen: &mut UidGen,
) {
    let ctx = Ctx::background();
    let example = fresh_example(store, gen);

    // Pre-linkage data: rows exist with all-null pointers.
    let mut ids = Vec::new();
    for i in 0..3 {
        let row = draft(gen, example, "k", &format!("v{i}")).into_row(None, None);
        store.create(&ctx, table, &row).unwrap();
        ids.push(row.id);
    }

    // The anchor picks one unlinked row; the rest are invisible until linked.
    let partial = store.list_ordered(&ctx, table, example).unwrap();
    assert_eq!(partial.rows.len(), 1);
    assert_eq!(partial.scope_len, 3);
    assert_eq!(partial.missing(), 2);
    assert!(ids.contains(&partial.rows[0].row.id));

    let linked = store.relink_scope(&ctx, table, example).unwrap();
    assert_eq!(linked, 3);
    assert_scope_valid(store, table, example);

    // Ids are byte-comparable and creation-ordered, so the stitched chain is
    // in creation order.
    let ordered = store.list_ordered(&ctx, table, example).unwrap();
    assert_eq!(ordered.ids(), ids);
}
