//! Unit tests for `PersistentHashMap`.
//!
//! Covers canonical equality after insert/remove round trips, collision
//! buckets, and the value-semantics requirements on keys.

use rstest::rstest;
use spork_pds::persistent::PersistentHashMap;
use spork_pds::value::{Value, hash_value};
use std::hash::{Hash, Hasher};

fn string_map(entries: &[(&str, i64)]) -> PersistentHashMap<String, i64> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), *value))
        .collect()
}

fn std_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Canonical insert/remove equality
// =============================================================================

#[rstest]
fn test_insert_then_remove_restores_value_and_hash() {
    let m0 = string_map(&[("a", 1), ("b", 2), ("c", 3)]);
    let m1 = m0.insert("d".to_string(), 4).remove("d");

    assert_eq!(m1, m0);
    assert_eq!(std_hash(&m1), std_hash(&m0));
}

#[rstest]
fn test_remove_canonicalizes_deep_tries() {
    let full: PersistentHashMap<i64, i64> = (0..500).map(|key| (key, key)).collect();
    let mut shrunk = full.clone();
    for key in 100..500 {
        shrunk = shrunk.remove(&key);
    }
    let direct: PersistentHashMap<i64, i64> = (0..100).map(|key| (key, key)).collect();

    assert_eq!(shrunk, direct);
    assert_eq!(std_hash(&shrunk), std_hash(&direct));
    assert_eq!(full.len(), 500); // Original untouched
}

#[rstest]
fn test_insertion_order_is_invisible() {
    let forward: PersistentHashMap<i64, i64> = (0..200).map(|key| (key, -key)).collect();
    let backward: PersistentHashMap<i64, i64> = (0..200).rev().map(|key| (key, -key)).collect();
    assert_eq!(forward, backward);
    assert_eq!(std_hash(&forward), std_hash(&backward));
}

// =============================================================================
// Collision buckets
// =============================================================================

/// Key hashing to a constant, to force full-hash collisions.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SameHash(&'static str);

impl Hash for SameHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(0xDEAD);
    }
}

#[rstest]
fn test_forced_collisions_roundtrip() {
    let names = ["a", "b", "c", "d", "e"];
    let mut map = PersistentHashMap::new();
    for (value, name) in names.iter().enumerate() {
        map = map.insert(SameHash(name), value);
    }
    assert_eq!(map.len(), 5);
    for (value, name) in names.iter().enumerate() {
        assert_eq!(map.get(&SameHash(name)), Some(&value));
    }

    let mut shrunk = map.clone();
    for name in &names[..4] {
        shrunk = shrunk.remove(&SameHash(name));
    }
    assert_eq!(shrunk.len(), 1);
    assert_eq!(shrunk.get(&SameHash("e")), Some(&4));
    assert_eq!(shrunk, PersistentHashMap::singleton(SameHash("e"), 4));
}

// =============================================================================
// Value-keyed semantics
// =============================================================================

#[rstest]
fn test_int_and_float_keys_collide() {
    let map = PersistentHashMap::new().insert(Value::Int(1), Value::from("one"));
    assert_eq!(map.get(&Value::Float(1.0)), Some(&Value::from("one")));

    let replaced = map.insert(Value::Float(1.0), Value::from("uno"));
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced.get(&Value::Int(1)), Some(&Value::from("uno")));
}

#[rstest]
fn test_keyword_and_string_keys_stay_distinct() {
    let map = PersistentHashMap::new()
        .insert(Value::keyword("k"), Value::Int(1))
        .insert(Value::from("k"), Value::Int(2));
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&Value::keyword("k")), Some(&Value::Int(1)));
    assert_eq!(map.get(&Value::from("k")), Some(&Value::Int(2)));
}

#[rstest]
fn test_nil_value_is_not_absence() {
    let map = PersistentHashMap::new().insert(Value::keyword("gone"), Value::Nil);
    assert!(map.contains_key(&Value::keyword("gone")));
    assert_eq!(map.get(&Value::keyword("gone")), Some(&Value::Nil));
    assert!(!map.contains_key(&Value::keyword("missing")));
}

#[rstest]
fn test_equal_value_maps_hash_equal() {
    let first = PersistentHashMap::new()
        .insert(Value::Int(1), Value::from("a"))
        .insert(Value::keyword("x"), Value::from("b"));
    let second = PersistentHashMap::new()
        .insert(Value::keyword("x"), Value::from("b"))
        .insert(Value::Float(1.0), Value::from("a"));

    assert_eq!(first, second);
    assert_eq!(
        hash_value(&Value::Map(first)),
        hash_value(&Value::Map(second))
    );
}
