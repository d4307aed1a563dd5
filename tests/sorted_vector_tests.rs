//! Unit tests for the sorted vector and its ordering configuration.

use rstest::rstest;
use spork_pds::ops::{conj, into, sorted_vec, vec};
use spork_pds::seq::SeqIter;
use spork_pds::value::{Value, value_fn};

fn ints(coll: &Value) -> Vec<i64> {
    SeqIter::new(coll.clone())
        .map(|item| match item.unwrap() {
            Value::Int(number) => number,
            other => panic!("expected an int, got {other}"),
        })
        .collect()
}

fn int_vec(values: &[i64]) -> Value {
    vec(values.iter().map(|value| Value::Int(*value)))
}

#[rstest]
fn test_into_sorted_vec_orders_ascending() {
    let sorted = into(&sorted_vec(None, false), &int_vec(&[3, 1, 4, 1, 5, 9, 2, 6])).unwrap();
    assert_eq!(ints(&sorted), vec![1, 1, 2, 3, 4, 5, 6, 9]);
}

#[rstest]
fn test_into_sorted_vec_reversed() {
    let sorted = into(&sorted_vec(None, true), &int_vec(&[3, 1, 4, 1, 5, 9, 2, 6])).unwrap();
    assert_eq!(ints(&sorted), vec![9, 6, 5, 4, 3, 2, 1, 1]);
}

#[rstest]
fn test_conj_keeps_order_and_shares() {
    let sorted = into(&sorted_vec(None, false), &int_vec(&[2, 4, 6])).unwrap();
    let grown = conj(&sorted, Value::Int(5)).unwrap();

    assert_eq!(ints(&sorted), vec![2, 4, 6]);
    assert_eq!(ints(&grown), vec![2, 4, 5, 6]);
}

#[rstest]
fn test_key_function_orders_by_projection() {
    let absolute = value_fn(|value| match value {
        Value::Int(number) => Value::Int(number.abs()),
        other => other.clone(),
    });
    let sorted = into(
        &sorted_vec(Some(absolute), false),
        &int_vec(&[-3, 1, -2, 4]),
    )
    .unwrap();
    assert_eq!(ints(&sorted), vec![1, -2, -3, 4]);
}

#[rstest]
fn test_uncomparable_elements_fail() {
    let sorted = into(&sorted_vec(None, false), &int_vec(&[1, 2])).unwrap();
    assert!(conj(&sorted, Value::from("oops")).is_err());
}

#[rstest]
fn test_duplicate_keys_insert_first_among_equals() {
    let first_char = value_fn(|value| match value {
        Value::Str(text) => text
            .chars()
            .next()
            .map_or(Value::Nil, |c| Value::string(&c.to_string())),
        other => other.clone(),
    });
    let sorted = sorted_vec(Some(first_char), false);
    let sorted = conj(&sorted, Value::from("ax")).unwrap();
    let sorted = conj(&sorted, Value::from("bx")).unwrap();
    let sorted = conj(&sorted, Value::from("ay")).unwrap();

    let realized: Vec<Value> = SeqIter::new(sorted).map(Result::unwrap).collect();
    // "ay" sorts equal to "ax" under the key and lands before it
    assert_eq!(
        realized,
        vec![Value::from("ay"), Value::from("ax"), Value::from("bx")]
    );
}
