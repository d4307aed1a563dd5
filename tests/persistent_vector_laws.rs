//! Property-based tests for `PersistentVector` laws.
//!
//! Verifies the vector against a `Vec` reference model and checks the
//! persistence and round-trip invariants with proptest.

use proptest::prelude::*;
use spork_pds::persistent::{PersistentVector, TransientVector};

/// One step of the randomized op sequence run against both models.
#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    Pop,
    Update(usize, i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Push),
        Just(Op::Pop),
        (any::<usize>(), any::<i32>()).prop_map(|(index, value)| Op::Update(index, value)),
    ]
}

proptest! {
    /// Reference equivalence: contents and length agree with a Vec after
    /// every step of a random op sequence.
    #[test]
    fn prop_matches_reference_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut vector: PersistentVector<i32> = PersistentVector::new();
        let mut reference: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    vector = vector.push_back(value);
                    reference.push(value);
                }
                Op::Pop => {
                    let popped = vector.pop_back();
                    let expected = reference.pop();
                    prop_assert_eq!(popped.as_ref().map(|(_, value)| value), expected.as_ref());
                    if let Some((next, _)) = popped {
                        vector = next;
                    }
                }
                Op::Update(index, value) => {
                    if reference.is_empty() {
                        prop_assert!(vector.update(index, value).is_none());
                    } else {
                        let position = index % reference.len();
                        vector = vector.update(position, value).unwrap();
                        reference[position] = value;
                    }
                }
            }

            prop_assert_eq!(vector.len(), reference.len());
            let realized: Vec<i32> = vector.iter().copied().collect();
            prop_assert_eq!(&realized, &reference);
        }
    }

    /// Persistence: a held version is unaffected by later operations on
    /// derived versions.
    #[test]
    fn prop_held_versions_are_immutable(
        elements in prop::collection::vec(any::<i32>(), 1..100),
        updates in prop::collection::vec(any::<i32>(), 1..50)
    ) {
        let original: PersistentVector<i32> = elements.iter().copied().collect();
        let snapshot: Vec<i32> = original.iter().copied().collect();

        let mut derived = original.clone();
        for (offset, value) in updates.iter().enumerate() {
            let index = offset % original.len();
            derived = derived.update(index, *value).unwrap();
            derived = derived.push_back(*value);
        }

        let after: Vec<i32> = original.iter().copied().collect();
        prop_assert_eq!(after, snapshot);
    }

    /// Push-pop round trip restores the original vector.
    #[test]
    fn prop_push_pop_inverse(
        elements in prop::collection::vec(any::<i32>(), 0..100),
        extra: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let (restored, popped) = vector.push_back(extra).pop_back().unwrap();
        prop_assert_eq!(popped, extra);
        prop_assert_eq!(restored, vector);
    }

    /// conj appends: the new element lands at the old length.
    #[test]
    fn prop_conj_appends(
        elements in prop::collection::vec(any::<i32>(), 0..100),
        extra: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let appended = vector.push_back(extra);
        prop_assert_eq!(appended.len(), vector.len() + 1);
        prop_assert_eq!(appended.get(vector.len()), Some(&extra));
    }

    /// A transient built from a persistent origin never disturbs it, and
    /// the conversion round trip with no intervening ops is the identity.
    #[test]
    fn prop_transient_isolation(
        elements in prop::collection::vec(any::<i32>(), 0..100),
        pushes in prop::collection::vec(any::<i32>(), 0..100)
    ) {
        let original: PersistentVector<i32> = elements.iter().copied().collect();

        let untouched = TransientVector::from_persistent(original.clone()).persistent();
        prop_assert_eq!(&untouched, &original);

        let mut transient = TransientVector::from_persistent(original.clone());
        for value in &pushes {
            transient.push_back(*value);
        }
        let built = transient.persistent();

        let expected: Vec<i32> = elements.iter().chain(pushes.iter()).copied().collect();
        let realized: Vec<i32> = built.iter().copied().collect();
        prop_assert_eq!(realized, expected);

        let original_after: Vec<i32> = original.iter().copied().collect();
        prop_assert_eq!(original_after, elements);
    }

    /// The chunk view covers exactly the iteration order.
    #[test]
    fn prop_chunks_cover_iteration(elements in prop::collection::vec(any::<i32>(), 0..2000)) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let via_chunks: Vec<i32> = vector.chunks().flatten().copied().collect();
        prop_assert_eq!(via_chunks, elements);
    }
}
