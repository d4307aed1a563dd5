//! Unit tests for `PersistentVector`.
//!
//! Covers the tail-boundary scenarios, structural sharing, and the
//! root-height transitions.

use rstest::rstest;
use spork_pds::persistent::{PersistentVector, TransientVector};

// =============================================================================
// Tail boundary round trips
// =============================================================================

#[rstest]
fn test_conj_through_tail_boundary() {
    let mut vector: PersistentVector<i64> = PersistentVector::new();
    for value in 0..=32 {
        vector = vector.push_back(value);
    }

    assert_eq!(vector.len(), 33);
    assert_eq!(vector.get(0), Some(&0));
    assert_eq!(vector.get(32), Some(&32));

    let (popped, last) = vector.pop_back().unwrap();
    assert_eq!(last, 32);
    assert_eq!(popped.len(), 32);
    assert_eq!(popped.get(31), Some(&31));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(31)]
#[case(32)]
#[case(33)]
#[case(1023)]
#[case(1024)]
#[case(1025)]
fn test_every_index_readable(#[case] size: usize) {
    let vector: PersistentVector<usize> = (0..size).collect();
    assert_eq!(vector.len(), size);
    for index in (0..size).step_by(7) {
        assert_eq!(vector.get(index), Some(&index));
    }
    assert_eq!(vector.get(size), None);
}

#[rstest]
fn test_three_level_root_transition() {
    // 32 * 32 * 32 = 32768: the root grows to three levels around here
    for size in [32767_usize, 32768, 32769] {
        let vector: PersistentVector<usize> = (0..size).collect();
        assert_eq!(vector.len(), size);
        assert_eq!(vector.get(0), Some(&0));
        assert_eq!(vector.get(size / 2), Some(&(size / 2)));
        assert_eq!(vector.get(size - 1), Some(&(size - 1)));
    }
}

#[rstest]
fn test_pop_back_through_height_shrink() {
    let mut vector: PersistentVector<usize> = (0..1025).collect();
    for expected in (513..1025).rev() {
        let (next, value) = vector.pop_back().unwrap();
        assert_eq!(value, expected);
        vector = next;
    }
    assert_eq!(vector.len(), 513);
    for index in [0, 100, 512] {
        assert_eq!(vector.get(index), Some(&index));
    }
}

// =============================================================================
// Structural sharing
// =============================================================================

#[rstest]
fn test_update_shares_structure() {
    let v0: PersistentVector<i64> = (1..=5).collect();
    let v1 = v0.update(2, 99).unwrap();

    assert_eq!(v0.get(2), Some(&3));
    assert_eq!(v1.get(2), Some(&99));
    assert_eq!(v0.len(), 5);
    assert_eq!(v1.len(), 5);
}

#[rstest]
fn test_old_versions_survive_heavy_mutation() {
    let original: PersistentVector<usize> = (0..600).collect();
    let snapshot = original.clone();

    let mut current = original;
    for index in 0..600 {
        current = current.update(index, index + 1000).unwrap();
    }
    for _ in 0..300 {
        let (next, _) = current.pop_back().unwrap();
        current = next;
    }

    assert_eq!(snapshot.len(), 600);
    for index in (0..600).step_by(13) {
        assert_eq!(snapshot.get(index), Some(&index));
    }
}

// =============================================================================
// Bulk construction
// =============================================================================

#[rstest]
fn test_collect_equals_push_back_loop() {
    let collected: PersistentVector<i64> = (0..200).collect();
    let mut pushed: PersistentVector<i64> = PersistentVector::new();
    for value in 0..200 {
        pushed = pushed.push_back(value);
    }
    assert_eq!(collected, pushed);
}

#[rstest]
fn test_transient_and_persistent_agree() {
    let mut transient = TransientVector::new();
    let mut persistent: PersistentVector<i64> = PersistentVector::new();
    for value in 0..300 {
        transient.push_back(value);
        persistent = persistent.push_back(value);
    }
    assert_eq!(transient.persistent(), persistent);
}

#[rstest]
fn test_chunks_match_iteration() {
    let vector: PersistentVector<i64> = (0..1000).collect();
    let via_chunks: Vec<i64> = vector.chunks().flatten().copied().collect();
    let via_iter: Vec<i64> = vector.iter().copied().collect();
    assert_eq!(via_chunks, via_iter);
}

#[rstest]
fn test_primitive_chunks_are_packed() {
    let vector: PersistentVector<f64> = (0..100).map(f64::from).collect();
    let mut total = 0.0;
    for chunk in vector.chunks() {
        // Each chunk is a contiguous &[f64] a numeric kernel could consume
        total += chunk.iter().sum::<f64>();
    }
    assert_eq!(total, 4950.0);
}
