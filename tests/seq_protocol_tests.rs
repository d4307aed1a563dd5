//! Tests for the generic protocol bridge: dispatch across collection
//! kinds, totality of the seq accessors, and the error taxonomy.

use rstest::rstest;
use spork_pds::error::PdsError;
use spork_pds::ops::{
    assoc, conj, contains, count, dissoc, empty, get, hash_map, hash_set, into, nth, pop, vec,
};
use spork_pds::seq::{SeqIter, cons, first, rest, seq};
use spork_pds::value::Value;

fn int_vec(values: &[i64]) -> Value {
    vec(values.iter().map(|value| Value::Int(*value)))
}

// =============================================================================
// Seq totality
// =============================================================================

#[rstest]
fn test_first_rest_total_over_empty() {
    assert_eq!(first(&Value::Nil).unwrap(), Value::Nil);
    let tail = rest(&Value::Nil).unwrap();
    assert_eq!(first(&tail).unwrap(), Value::Nil);
    assert_eq!(rest(&tail).unwrap(), Value::Nil);
}

#[rstest]
fn test_seq_of_empty_is_nil() {
    assert_eq!(seq(&int_vec(&[])).unwrap(), Value::Nil);
    assert_eq!(seq(&hash_set(std::iter::empty())).unwrap(), Value::Nil);
    assert_eq!(seq(&Value::Nil).unwrap(), Value::Nil);
}

#[rstest]
fn test_rest_chains_to_exhaustion() {
    let mut current = seq(&int_vec(&[1, 2])).unwrap();
    current = rest(&current).unwrap();
    current = rest(&current).unwrap();
    assert_eq!(current, Value::Nil);
    // Chaining past the end keeps returning a valid empty seq
    assert_eq!(rest(&current).unwrap(), Value::Nil);
}

// =============================================================================
// Dispatch per kind
// =============================================================================

#[rstest]
fn test_count_per_kind() {
    assert_eq!(count(&Value::Nil).unwrap(), 0);
    assert_eq!(count(&int_vec(&[1, 2, 3])).unwrap(), 3);
    assert_eq!(
        count(&hash_map([Value::Int(1), Value::Int(2)]).unwrap()).unwrap(),
        1
    );
    assert_eq!(count(&Value::from("abc")).unwrap(), 3);
    let list = cons(Value::Int(1), cons(Value::Int(2), Value::Nil).unwrap()).unwrap();
    assert_eq!(count(&list).unwrap(), 2);
}

#[rstest]
fn test_nth_dispatch() {
    assert_eq!(nth(&int_vec(&[5, 6]), 1, None).unwrap(), Value::Int(6));

    let list = cons(Value::Int(5), cons(Value::Int(6), Value::Nil).unwrap()).unwrap();
    assert_eq!(nth(&list, 1, None).unwrap(), Value::Int(6));

    assert!(matches!(
        nth(&hash_map(std::iter::empty()).unwrap(), 0, None),
        Err(PdsError::UnsupportedOperation { operation: "nth", .. })
    ));
    assert!(matches!(
        nth(&hash_set(std::iter::empty()), 0, None),
        Err(PdsError::UnsupportedOperation { operation: "nth", .. })
    ));
}

#[rstest]
fn test_conj_dispatch() {
    // Vector appends
    let vector = conj(&int_vec(&[1]), Value::Int(2)).unwrap();
    assert_eq!(nth(&vector, 1, None).unwrap(), Value::Int(2));

    // Seq prepends
    let list = conj(&seq(&int_vec(&[2, 3])).unwrap(), Value::Int(1)).unwrap();
    assert_eq!(first(&list).unwrap(), Value::Int(1));

    // Map takes an entry
    let map = conj(
        &hash_map(std::iter::empty()).unwrap(),
        int_vec(&[1, 10]),
    )
    .unwrap();
    assert_eq!(get(&map, &Value::Int(1), None), Value::Int(10));

    // Set adds
    let set = conj(&hash_set(std::iter::empty()), Value::Int(1)).unwrap();
    assert!(contains(&set, &Value::Int(1)).unwrap());
}

#[rstest]
fn test_assoc_dispatch_and_errors() {
    let map = assoc(&Value::Nil, Value::keyword("k"), Value::Int(1)).unwrap();
    assert_eq!(get(&map, &Value::keyword("k"), None), Value::Int(1));

    let vector = assoc(&int_vec(&[1, 2]), Value::Int(2), Value::Int(3)).unwrap();
    assert_eq!(count(&vector).unwrap(), 3);

    let list = cons(Value::Int(1), Value::Nil).unwrap();
    assert!(matches!(
        assoc(&list, Value::Int(0), Value::Int(9)),
        Err(PdsError::UnsupportedOperation { .. })
    ));
    assert!(matches!(
        assoc(&int_vec(&[1]), Value::keyword("x"), Value::Int(9)),
        Err(PdsError::TypeMismatch { .. })
    ));
}

#[rstest]
fn test_dissoc_disj_empty_pop() {
    let map = hash_map([Value::Int(1), Value::Int(10)]).unwrap();
    assert_eq!(count(&dissoc(&map, &Value::Int(1)).unwrap()).unwrap(), 0);

    let set = hash_set([Value::Int(1)]);
    assert!(matches!(
        pop(&set),
        Err(PdsError::UnsupportedOperation { .. })
    ));

    assert_eq!(empty(&map).unwrap(), hash_map(std::iter::empty()).unwrap());
    assert!(matches!(
        pop(&int_vec(&[])),
        Err(PdsError::IndexOutOfRange { .. })
    ));
}

#[rstest]
fn test_get_never_fails() {
    assert_eq!(get(&Value::Int(3), &Value::Int(0), None), Value::Nil);
    assert_eq!(
        get(&Value::Bool(true), &Value::Int(0), Some(Value::Int(7))),
        Value::Int(7)
    );
    // Set lookup returns the stored element
    let set = hash_set([Value::Int(5)]);
    assert_eq!(get(&set, &Value::Float(5.0), None), Value::Int(5));
}

// =============================================================================
// into across kinds
// =============================================================================

#[rstest]
fn test_into_map_from_map_seq() {
    let source = hash_map([
        Value::keyword("a"),
        Value::Int(1),
        Value::keyword("b"),
        Value::Int(2),
    ])
    .unwrap();
    let copied = into(&hash_map(std::iter::empty()).unwrap(), &source).unwrap();
    assert_eq!(copied, source);
}

#[rstest]
fn test_into_set_dedups() {
    let set = into(&hash_set(std::iter::empty()), &int_vec(&[1, 1, 2, 2, 3])).unwrap();
    assert_eq!(count(&set).unwrap(), 3);
}

#[rstest]
fn test_seq_over_map_roundtrips_entries() {
    let source = hash_map([
        Value::keyword("a"),
        Value::Int(1),
        Value::keyword("b"),
        Value::Int(2),
    ])
    .unwrap();
    let entries: Vec<Value> = SeqIter::new(seq(&source).unwrap())
        .map(Result::unwrap)
        .collect();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert_eq!(count(&entry).unwrap(), 2);
    }
}
