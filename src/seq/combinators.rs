//! Lazy sequence combinators.
//!
//! Every combinator returns a [`lazy_seq`](super::lazy_seq) that, when
//! forced, realizes exactly one element plus a thunk for the tail. Nothing
//! is computed before the first observation, and a cell is never computed
//! twice (forcing is memoized). Skipping combinators (`filter`, `drop`,
//! `keep`, ...) consume source cells until they can yield, which is the
//! minimum the semantics allow.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::seq::{SeqIter, iterate, take};
//! use spork_pds::value::{Value, value_fn};
//!
//! let increment = value_fn(|value| match value {
//!     Value::Int(number) => Value::Int(number + 1),
//!     other => other.clone(),
//! });
//! let naturals = iterate(increment, Value::Int(0));
//! let firsts: Vec<Value> = SeqIter::new(take(3, &naturals))
//!     .map(Result::unwrap)
//!     .collect();
//! assert_eq!(firsts, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
//! ```

use super::{Cons, lazy_seq, split_first};
use crate::error::{PdsError, Result};
use crate::persistent::{PersistentHashSet, ReferenceCounter};
use crate::value::{Value, ValueFn, ValueFn2};

/// Builds one realized cell.
fn cell(first: Value, rest: Value) -> Result<Value> {
    Ok(Value::Cons(ReferenceCounter::new(Cons::new(first, rest))))
}

// =============================================================================
// Mapping and filtering
// =============================================================================

/// Lazily maps a function over a sequence.
pub fn map(function: ValueFn, coll: &Value) -> Value {
    map_step(function, coll.clone())
}

fn map_step(function: ValueFn, coll: Value) -> Value {
    lazy_seq(move || match split_first(&coll)? {
        None => Ok(Value::Nil),
        Some((element, tail)) => {
            let mapped = function(&element);
            cell(mapped, map_step(function, tail))
        }
    })
}

/// Lazily maps a two-argument function over two sequences in lockstep,
/// ending with the shorter.
pub fn map2(function: ValueFn2, left: &Value, right: &Value) -> Value {
    map2_step(function, left.clone(), right.clone())
}

fn map2_step(function: ValueFn2, left: Value, right: Value) -> Value {
    lazy_seq(move || {
        match (split_first(&left)?, split_first(&right)?) {
            (Some((first, left_tail)), Some((second, right_tail))) => {
                let mapped = function(&first, &second);
                cell(mapped, map2_step(function, left_tail, right_tail))
            }
            _ => Ok(Value::Nil),
        }
    })
}

/// Lazily maps a function of `(index, element)` over a sequence.
pub fn map_indexed(function: ValueFn2, coll: &Value) -> Value {
    map_indexed_step(function, 0, coll.clone())
}

fn map_indexed_step(function: ValueFn2, index: i64, coll: Value) -> Value {
    lazy_seq(move || match split_first(&coll)? {
        None => Ok(Value::Nil),
        Some((element, tail)) => {
            let mapped = function(&Value::Int(index), &element);
            cell(mapped, map_indexed_step(function, index + 1, tail))
        }
    })
}

/// Lazily keeps the elements for which the predicate is truthy.
pub fn filter(predicate: ValueFn, coll: &Value) -> Value {
    filter_step(predicate, coll.clone())
}

fn filter_step(predicate: ValueFn, coll: Value) -> Value {
    lazy_seq(move || {
        let mut current = coll;
        loop {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    if predicate(&element).is_truthy() {
                        return cell(element, filter_step(predicate, tail));
                    }
                    current = tail;
                }
            }
        }
    })
}

/// Lazily keeps the non-nil results of the function.
pub fn keep(function: ValueFn, coll: &Value) -> Value {
    keep_step(function, coll.clone())
}

fn keep_step(function: ValueFn, coll: Value) -> Value {
    lazy_seq(move || {
        let mut current = coll;
        loop {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    let mapped = function(&element);
                    if !mapped.is_nil() {
                        return cell(mapped, keep_step(function, tail));
                    }
                    current = tail;
                }
            }
        }
    })
}

/// Lazily keeps the non-nil results of a function of `(index, element)`.
pub fn keep_indexed(function: ValueFn2, coll: &Value) -> Value {
    keep_indexed_step(function, 0, coll.clone())
}

fn keep_indexed_step(function: ValueFn2, index: i64, coll: Value) -> Value {
    lazy_seq(move || {
        let mut index = index;
        let mut current = coll;
        loop {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    let mapped = function(&Value::Int(index), &element);
                    if !mapped.is_nil() {
                        return cell(mapped, keep_indexed_step(function, index + 1, tail));
                    }
                    index += 1;
                    current = tail;
                }
            }
        }
    })
}

/// Lazily maps, then concatenates the (seqable) results.
pub fn mapcat(function: ValueFn, coll: &Value) -> Value {
    mapcat_step(function, Value::Nil, coll.clone())
}

fn mapcat_step(function: ValueFn, inner: Value, outer: Value) -> Value {
    lazy_seq(move || {
        let mut inner = inner;
        let mut outer = outer;
        loop {
            if let Some((element, inner_tail)) = split_first(&inner)? {
                return cell(element, mapcat_step(function, inner_tail, outer));
            }
            match split_first(&outer)? {
                None => return Ok(Value::Nil),
                Some((element, outer_tail)) => {
                    inner = function(&element);
                    outer = outer_tail;
                }
            }
        }
    })
}

// =============================================================================
// Taking and dropping
// =============================================================================

/// Lazily takes the first `count` elements.
pub fn take(count: usize, coll: &Value) -> Value {
    take_step(count, coll.clone())
}

fn take_step(count: usize, coll: Value) -> Value {
    lazy_seq(move || {
        if count == 0 {
            return Ok(Value::Nil);
        }
        match split_first(&coll)? {
            None => Ok(Value::Nil),
            Some((element, tail)) => cell(element, take_step(count - 1, tail)),
        }
    })
}

/// Lazily drops the first `count` elements.
pub fn drop(count: usize, coll: &Value) -> Value {
    let coll = coll.clone();
    lazy_seq(move || {
        let mut remaining = count;
        let mut current = coll;
        while remaining > 0 {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((_, tail)) => {
                    current = tail;
                    remaining -= 1;
                }
            }
        }
        Ok(current)
    })
}

/// Lazily takes elements while the predicate is truthy.
pub fn take_while(predicate: ValueFn, coll: &Value) -> Value {
    take_while_step(predicate, coll.clone())
}

fn take_while_step(predicate: ValueFn, coll: Value) -> Value {
    lazy_seq(move || match split_first(&coll)? {
        None => Ok(Value::Nil),
        Some((element, tail)) => {
            if predicate(&element).is_truthy() {
                cell(element, take_while_step(predicate, tail))
            } else {
                Ok(Value::Nil)
            }
        }
    })
}

/// Lazily drops elements while the predicate is truthy, then yields the
/// rest.
pub fn drop_while(predicate: ValueFn, coll: &Value) -> Value {
    let coll = coll.clone();
    lazy_seq(move || {
        let mut current = coll;
        loop {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    if predicate(&element).is_truthy() {
                        current = tail;
                    } else {
                        return cell(element, tail);
                    }
                }
            }
        }
    })
}

// =============================================================================
// Generators
// =============================================================================

/// Lazily concatenates the given collections.
pub fn concat(colls: &[Value]) -> Value {
    concat_step(Value::Nil, colls.to_vec())
}

fn concat_step(current: Value, pending: Vec<Value>) -> Value {
    lazy_seq(move || {
        let mut current = current;
        let mut pending = pending;
        loop {
            if let Some((element, tail)) = split_first(&current)? {
                return cell(element, concat_step(tail, pending));
            }
            if pending.is_empty() {
                return Ok(Value::Nil);
            }
            current = pending.remove(0);
        }
    })
}

/// The infinite sequence `seed, f(seed), f(f(seed)), ...`.
///
/// `f` is applied lazily: observing `k` elements calls it `k - 1` times.
pub fn iterate(function: ValueFn, seed: Value) -> Value {
    lazy_seq(move || {
        let tail_function = function.clone();
        let tail_seed = seed.clone();
        let tail = lazy_seq(move || {
            let next = tail_function(&tail_seed);
            Ok(iterate(tail_function, next))
        });
        cell(seed, tail)
    })
}

/// The integers from `start` (inclusive) to `end` (exclusive).
#[must_use]
pub fn range(start: i64, end: i64) -> Value {
    range_seq(start, Some(end), 1)
}

/// The integers from `start` to `end` by `step`; counts down when the step
/// is negative. Fails on a zero step.
pub fn range_step(start: i64, end: i64, step: i64) -> Result<Value> {
    if step == 0 {
        return Err(PdsError::ArityMismatch {
            operation: "range",
            expected: "a non-zero step",
        });
    }
    Ok(range_seq(start, Some(end), step))
}

/// The unbounded integers from `start`.
#[must_use]
pub fn range_from(start: i64) -> Value {
    range_seq(start, None, 1)
}

fn range_seq(current: i64, end: Option<i64>, step: i64) -> Value {
    lazy_seq(move || {
        let exhausted = match end {
            Some(limit) => {
                if step > 0 {
                    current >= limit
                } else {
                    current <= limit
                }
            }
            None => false,
        };
        if exhausted {
            return Ok(Value::Nil);
        }
        let rest = match current.checked_add(step) {
            Some(next) => range_seq(next, end, step),
            None => Value::Nil,
        };
        cell(Value::Int(current), rest)
    })
}

/// Endlessly repeats the elements of a collection. Cycling an empty
/// collection is empty.
pub fn cycle(coll: &Value) -> Value {
    cycle_step(coll.clone(), coll.clone())
}

fn cycle_step(original: Value, current: Value) -> Value {
    lazy_seq(move || {
        if let Some((element, tail)) = split_first(&current)? {
            return cell(element, cycle_step(original, tail));
        }
        match split_first(&original)? {
            None => Ok(Value::Nil),
            Some((element, tail)) => cell(element, cycle_step(original.clone(), tail)),
        }
    })
}

/// The infinite sequence of a single value.
pub fn repeat(value: Value) -> Value {
    lazy_seq(move || cell(value.clone(), repeat(value)))
}

/// `count` copies of a value.
pub fn repeat_n(count: usize, value: Value) -> Value {
    lazy_seq(move || {
        if count == 0 {
            return Ok(Value::Nil);
        }
        cell(value.clone(), repeat_n(count - 1, value))
    })
}

// =============================================================================
// Reshaping
// =============================================================================

/// Lazily interleaves the collections, ending when any runs out.
pub fn interleave(colls: &[Value]) -> Value {
    if colls.is_empty() {
        return Value::Nil;
    }
    interleave_step(colls.to_vec())
}

fn interleave_step(colls: Vec<Value>) -> Value {
    lazy_seq(move || {
        let mut firsts = Vec::with_capacity(colls.len());
        let mut tails = Vec::with_capacity(colls.len());
        for coll in &colls {
            match split_first(coll)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    firsts.push(element);
                    tails.push(tail);
                }
            }
        }
        let mut result = interleave_step(tails);
        for element in firsts.into_iter().rev() {
            result = Value::Cons(ReferenceCounter::new(Cons::new(element, result)));
        }
        Ok(result)
    })
}

/// Lazily inserts a separator between consecutive elements.
pub fn interpose(separator: Value, coll: &Value) -> Value {
    let coll = coll.clone();
    lazy_seq(move || match split_first(&coll)? {
        None => Ok(Value::Nil),
        Some((element, tail)) => cell(element, interpose_rest(separator, tail)),
    })
}

fn interpose_rest(separator: Value, coll: Value) -> Value {
    lazy_seq(move || match split_first(&coll)? {
        None => Ok(Value::Nil),
        Some((element, tail)) => {
            let after = cell(element, interpose_rest(separator.clone(), tail))?;
            cell(separator, after)
        }
    })
}

/// Lazily partitions into complete chunks of `size`; a trailing partial
/// chunk is discarded. Fails on a zero size.
pub fn partition(size: usize, coll: &Value) -> Result<Value> {
    if size == 0 {
        return Err(PdsError::ArityMismatch {
            operation: "partition",
            expected: "a positive chunk size",
        });
    }
    Ok(partition_step(size, coll.clone(), false))
}

/// Lazily partitions into chunks of `size`, keeping a trailing partial
/// chunk. Fails on a zero size.
pub fn partition_all(size: usize, coll: &Value) -> Result<Value> {
    if size == 0 {
        return Err(PdsError::ArityMismatch {
            operation: "partition-all",
            expected: "a positive chunk size",
        });
    }
    Ok(partition_step(size, coll.clone(), true))
}

fn partition_step(size: usize, coll: Value, keep_partial: bool) -> Value {
    lazy_seq(move || {
        let mut chunk = Vec::with_capacity(size);
        let mut current = coll;
        while chunk.len() < size {
            match split_first(&current)? {
                None => break,
                Some((element, tail)) => {
                    chunk.push(element);
                    current = tail;
                }
            }
        }
        if chunk.is_empty() || (chunk.len() < size && !keep_partial) {
            return Ok(Value::Nil);
        }
        cell(
            Value::Vector(chunk.into_iter().collect()),
            partition_step(size, current, keep_partial),
        )
    })
}

/// Lazily removes consecutive duplicates.
pub fn dedupe(coll: &Value) -> Value {
    dedupe_step(None, coll.clone())
}

fn dedupe_step(previous: Option<Value>, coll: Value) -> Value {
    lazy_seq(move || {
        let mut current = coll;
        loop {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    if previous.as_ref() == Some(&element) {
                        current = tail;
                    } else {
                        return cell(element.clone(), dedupe_step(Some(element), tail));
                    }
                }
            }
        }
    })
}

/// Lazily removes duplicates, keeping first occurrences.
pub fn distinct(coll: &Value) -> Value {
    distinct_step(PersistentHashSet::new(), coll.clone())
}

fn distinct_step(seen: PersistentHashSet<Value>, coll: Value) -> Value {
    lazy_seq(move || {
        let mut current = coll;
        loop {
            match split_first(&current)? {
                None => return Ok(Value::Nil),
                Some((element, tail)) => {
                    if seen.contains(&element) {
                        current = tail;
                    } else {
                        let seen_now = seen.insert(element.clone());
                        return cell(element, distinct_step(seen_now, tail));
                    }
                }
            }
        }
    })
}

/// Lazily flattens nested sequential values into one sequence of
/// non-sequential elements. A non-sequential argument flattens to the
/// empty sequence.
pub fn flatten(coll: &Value) -> Value {
    if !coll.is_sequential() && !coll.is_nil() {
        return Value::Nil;
    }
    flatten_step(vec![coll.clone()])
}

fn flatten_step(stack: Vec<Value>) -> Value {
    lazy_seq(move || {
        let mut stack = stack;
        loop {
            let Some(top) = stack.pop() else {
                return Ok(Value::Nil);
            };
            if let Some((element, tail)) = split_first(&top)? {
                stack.push(tail);
                if element.is_sequential() {
                    stack.push(element);
                } else {
                    return cell(element, flatten_step(stack));
                }
            }
        }
    })
}

/// Lazily yields the intermediate results of a left fold, starting with
/// the init (or the first element when no init is given).
pub fn reductions(function: ValueFn2, init: Option<Value>, coll: &Value) -> Value {
    let coll = coll.clone();
    match init {
        Some(initial) => reductions_step(function, initial, coll),
        None => lazy_seq(move || match split_first(&coll)? {
            None => Ok(Value::Nil),
            Some((first_element, tail)) => Ok(reductions_step(function, first_element, tail)),
        }),
    }
}

fn reductions_step(function: ValueFn2, accumulated: Value, coll: Value) -> Value {
    lazy_seq(move || {
        let tail_function = function.clone();
        let tail_accumulated = accumulated.clone();
        let tail = lazy_seq(move || match split_first(&coll)? {
            None => Ok(Value::Nil),
            Some((element, tail)) => {
                let next = tail_function(&tail_accumulated, &element);
                Ok(reductions_step(tail_function, next, tail))
            }
        });
        cell(accumulated, tail)
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::{SeqIter, list_of};
    use crate::value::{value_fn, value_fn2};
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    fn ints(value: &Value) -> Vec<i64> {
        SeqIter::new(value.clone())
            .map(|item| match item.unwrap() {
                Value::Int(number) => number,
                other => panic!("expected an int, got {other}"),
            })
            .collect()
    }

    fn int_list(values: &[i64]) -> Value {
        list_of(values.iter().map(|value| Value::Int(*value)).collect())
    }

    fn increment() -> ValueFn {
        value_fn(|value| match value {
            Value::Int(number) => Value::Int(number + 1),
            other => other.clone(),
        })
    }

    fn is_even() -> ValueFn {
        value_fn(|value| match value {
            Value::Int(number) => Value::Bool(number % 2 == 0),
            _ => Value::Bool(false),
        })
    }

    fn add() -> ValueFn2 {
        value_fn2(|left, right| match (left, right) {
            (Value::Int(first), Value::Int(second)) => Value::Int(first + second),
            _ => Value::Nil,
        })
    }

    #[rstest]
    fn test_map() {
        let mapped = map(increment(), &int_list(&[1, 2, 3]));
        assert_eq!(ints(&mapped), vec![2, 3, 4]);
    }

    #[rstest]
    fn test_map_is_lazy_and_memoized() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let effectful = value_fn(move |value| {
            counter.set(counter.get() + 1);
            value.clone()
        });

        let mapped = map(effectful, &range_from(0));
        assert_eq!(calls.get(), 0); // Nothing forced yet

        let limited = take(3, &mapped);
        let realized = ints(&limited);
        assert_eq!(realized, vec![0, 1, 2]);
        assert_eq!(calls.get(), 3); // Exactly three forced

        // A second traversal hits the memoized cells
        let again = ints(&limited);
        assert_eq!(again, vec![0, 1, 2]);
        assert_eq!(calls.get(), 3);
    }

    #[rstest]
    fn test_map2_stops_at_shorter() {
        let summed = map2(add(), &int_list(&[1, 2, 3]), &int_list(&[10, 20]));
        assert_eq!(ints(&summed), vec![11, 22]);
    }

    #[rstest]
    fn test_map_indexed() {
        let indexed = map_indexed(add(), &int_list(&[10, 10, 10]));
        assert_eq!(ints(&indexed), vec![10, 11, 12]);
    }

    #[rstest]
    fn test_filter() {
        let evens = filter(is_even(), &range(0, 10));
        assert_eq!(ints(&evens), vec![0, 2, 4, 6, 8]);
    }

    #[rstest]
    fn test_keep_drops_nil_results() {
        let function = value_fn(|value| match value {
            Value::Int(number) if number % 2 == 0 => Value::Int(number * 10),
            _ => Value::Nil,
        });
        let kept = keep(function, &range(0, 6));
        assert_eq!(ints(&kept), vec![0, 20, 40]);
    }

    #[rstest]
    fn test_keep_indexed() {
        let function = value_fn2(|index, value| match (index, value) {
            (Value::Int(position), element) if position % 2 == 0 => element.clone(),
            _ => Value::Nil,
        });
        let kept = keep_indexed(function, &int_list(&[10, 11, 12, 13, 14]));
        assert_eq!(ints(&kept), vec![10, 12, 14]);
    }

    #[rstest]
    fn test_mapcat() {
        let function = value_fn(|value| match value {
            Value::Int(number) => int_list(&[*number, *number]),
            other => other.clone(),
        });
        let flat = mapcat(function, &int_list(&[1, 2]));
        assert_eq!(ints(&flat), vec![1, 1, 2, 2]);
    }

    #[rstest]
    fn test_take_and_drop() {
        assert_eq!(ints(&take(3, &range(0, 100))), vec![0, 1, 2]);
        assert_eq!(ints(&take(5, &range(0, 2))), vec![0, 1]);
        assert_eq!(ints(&drop(97, &range(0, 100))), vec![97, 98, 99]);
        assert_eq!(ints(&drop(5, &range(0, 3))), Vec::<i64>::new());
    }

    #[rstest]
    fn test_take_while_drop_while() {
        let negative = value_fn(|value| match value {
            Value::Int(number) => Value::Bool(*number < 0),
            _ => Value::Bool(false),
        });
        let coll = int_list(&[-2, -1, 0, 1, -5]);
        assert_eq!(ints(&take_while(negative.clone(), &coll)), vec![-2, -1]);
        assert_eq!(ints(&drop_while(negative, &coll)), vec![0, 1, -5]);
    }

    #[rstest]
    fn test_concat() {
        let joined = concat(&[int_list(&[1, 2]), Value::Nil, int_list(&[3])]);
        assert_eq!(ints(&joined), vec![1, 2, 3]);
    }

    #[rstest]
    fn test_iterate_counts_applications() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let function = value_fn(move |value| {
            counter.set(counter.get() + 1);
            match value {
                Value::Int(number) => Value::Int(number + 1),
                other => other.clone(),
            }
        });

        let naturals = iterate(function, Value::Int(0));
        assert_eq!(ints(&take(5, &naturals)), vec![0, 1, 2, 3, 4]);
        assert_eq!(calls.get(), 4); // Five elements, four applications
    }

    #[rstest]
    fn test_range_variants() {
        assert_eq!(ints(&range(0, 5)), vec![0, 1, 2, 3, 4]);
        assert_eq!(ints(&range(3, 3)), Vec::<i64>::new());
        assert_eq!(ints(&range_step(0, 10, 3).unwrap()), vec![0, 3, 6, 9]);
        assert_eq!(ints(&range_step(5, 0, -2).unwrap()), vec![5, 3, 1]);
        assert!(range_step(0, 10, 0).is_err());
        assert_eq!(ints(&take(3, &range_from(40))), vec![40, 41, 42]);
    }

    #[rstest]
    fn test_cycle() {
        assert_eq!(
            ints(&take(7, &cycle(&int_list(&[1, 2, 3])))),
            vec![1, 2, 3, 1, 2, 3, 1]
        );
        assert_eq!(ints(&cycle(&Value::Nil)), Vec::<i64>::new());
    }

    #[rstest]
    fn test_repeat() {
        assert_eq!(ints(&take(3, &repeat(Value::Int(7)))), vec![7, 7, 7]);
        assert_eq!(ints(&repeat_n(2, Value::Int(7))), vec![7, 7]);
        assert_eq!(ints(&repeat_n(0, Value::Int(7))), Vec::<i64>::new());
    }

    #[rstest]
    fn test_interleave() {
        let woven = interleave(&[int_list(&[1, 2, 3]), int_list(&[10, 20])]);
        assert_eq!(ints(&woven), vec![1, 10, 2, 20]);
    }

    #[rstest]
    fn test_interpose() {
        let separated = interpose(Value::Int(0), &int_list(&[1, 2, 3]));
        assert_eq!(ints(&separated), vec![1, 0, 2, 0, 3]);
        assert_eq!(
            ints(&interpose(Value::Int(0), &int_list(&[1]))),
            vec![1]
        );
    }

    #[rstest]
    fn test_partition() {
        let chunks: Vec<Vec<i64>> = SeqIter::new(partition(2, &range(0, 5)).unwrap())
            .map(|chunk| ints(&chunk.unwrap()))
            .collect();
        assert_eq!(chunks, vec![vec![0, 1], vec![2, 3]]);

        let all_chunks: Vec<Vec<i64>> = SeqIter::new(partition_all(2, &range(0, 5)).unwrap())
            .map(|chunk| ints(&chunk.unwrap()))
            .collect();
        assert_eq!(all_chunks, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[rstest]
    fn test_dedupe_and_distinct() {
        let coll = int_list(&[1, 1, 2, 2, 1, 3, 3]);
        assert_eq!(ints(&dedupe(&coll)), vec![1, 2, 1, 3]);
        assert_eq!(ints(&distinct(&coll)), vec![1, 2, 3]);
    }

    #[rstest]
    fn test_flatten() {
        let nested = list_of(vec![
            int_list(&[1, 2]),
            Value::Int(3),
            list_of(vec![int_list(&[4]), Value::Int(5)]),
        ]);
        assert_eq!(ints(&flatten(&nested)), vec![1, 2, 3, 4, 5]);
        assert_eq!(ints(&flatten(&Value::Int(9))), Vec::<i64>::new());
    }

    #[rstest]
    fn test_reductions() {
        let sums = reductions(add(), None, &int_list(&[1, 2, 3, 4]));
        assert_eq!(ints(&sums), vec![1, 3, 6, 10]);

        let seeded = reductions(add(), Some(Value::Int(100)), &int_list(&[1, 2]));
        assert_eq!(ints(&seeded), vec![100, 101, 103]);
    }
}
