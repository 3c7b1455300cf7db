use proptest::prelude::*;
use rowchain_core::chain::{sort_linked, validate};
use rowchain_core::{ChildDraft, ChildRow, Uid};

fn scope() -> Uid {
    Uid::from_parts(7, 0)
}

fn chain_of(len: usize) -> Vec<ChildRow> {
    let ids: Vec<Uid> = (0..len as u64).map(|i| Uid::from_parts(100, i)).collect();
    (0..len)
        .map(|i| {
            let prev = (i > 0).then(|| ids[i - 1]);
            let next = (i + 1 < len).then(|| ids[i + 1]);
            ChildDraft::new(ids[i], scope(), format!("k{i}"), format!("v{i}"))
                .into_row(prev, next)
        })
        .collect()
}

proptest! {
    #[test]
    fn shuffled_chains_sort_back_to_creation_order(
        len in 0usize..32,
        seed in any::<u64>(),
    ) {
        let mut rows = chain_of(len);

        // Deterministic shuffle so failures replay.
        let mut state = seed | 1;
        for i in (1..rows.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            rows.swap(i, (state as usize) % (i + 1));
        }

        let sorted = sort_linked(&rows).unwrap();
        prop_assert_eq!(sorted.len(), len);
        for (i, row) in sorted.iter().enumerate() {
            prop_assert_eq!(row.id, Uid::from_parts(100, i as u64));
        }
    }

    #[test]
    fn redirecting_one_pointer_breaks_validation(
        len in 3usize..16,
        victim in 0usize..16,
        target in 0usize..16,
        hit_next in any::<bool>(),
    ) {
        let mut rows = chain_of(len);
        let victim = victim % len;
        // Aim the pointer somewhere it cannot belong, the row itself included.
        let target = Uid::from_parts(100, (target % len) as u64);
        let broke = if hit_next {
            let old = rows[victim].next;
            rows[victim].next = Some(target);
            old != Some(target)
        } else {
            let old = rows[victim].prev;
            rows[victim].prev = Some(target);
            old != Some(target)
        };
        if broke {
            prop_assert!(validate(&rows).is_err());
        }
    }
}
