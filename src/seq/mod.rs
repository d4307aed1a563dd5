//! The sequence protocol: cons cells, lazy sequences, and the `seq` view.
//!
//! Every collection in the runtime can be observed as a *seq* - the
//! abstract sequence whose values are nil (empty) or a cons of
//! (first, rest). [`seq`] coerces a value to that view without copying:
//! vectors project lazily by index, maps and sets project their entries,
//! cons cells and lazy seqs pass through, and `nil` is the canonical empty
//! seq.
//!
//! [`first`] and [`rest`] are total over seqs: `first(nil)` is nil and
//! `rest(nil)` is nil, so chaining never fails on exhaustion.
//!
//! The combinator library ([`map`], [`filter`], [`take`], ...) builds
//! thunk-backed [`LazySeq`] cells that realize exactly one element per
//! forced cell.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::seq::{cons, first, rest};
//! use spork_pds::value::Value;
//!
//! let list = cons(Value::Int(1), Value::Nil).unwrap();
//! assert_eq!(first(&list).unwrap(), Value::Int(1));
//! assert_eq!(rest(&list).unwrap(), Value::Nil);
//! assert_eq!(first(&Value::Nil).unwrap(), Value::Nil);
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::error::{PdsError, Result};
use crate::persistent::{PersistentVector, ReferenceCounter};
use crate::value::{Value, compare};

mod combinators;
mod lazy;

pub use combinators::*;
pub use lazy::LazySeq;

// =============================================================================
// Cons
// =============================================================================

/// An immutable pair of a first element and a rest sequence.
///
/// The rest is always a seq view: nil, another cons, or a lazy seq. Cons
/// cells over lazy tails are how the combinator library yields one element
/// without touching the next.
pub struct Cons {
    first: Value,
    rest: Value,
}

impl Cons {
    /// Creates a cons cell. `rest` must already be a seq view.
    #[must_use]
    pub const fn new(first: Value, rest: Value) -> Self {
        Self { first, rest }
    }

    /// Returns the first element.
    #[must_use]
    pub const fn first(&self) -> &Value {
        &self.first
    }

    /// Returns the rest sequence.
    #[must_use]
    pub const fn rest(&self) -> &Value {
        &self.rest
    }
}

impl fmt::Debug for Cons {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Cons")
            .field("first", &self.first)
            .finish_non_exhaustive()
    }
}

/// Prepends an element to a sequence.
///
/// The tail is coerced to a seq view without forcing: prepending to a lazy
/// sequence never realizes it. Fails with `UnsupportedOperation` when the
/// tail is not seqable.
///
/// # Examples
///
/// ```rust
/// use spork_pds::seq::{cons, first};
/// use spork_pds::value::Value;
///
/// let list = cons(Value::Int(0), Value::Nil).unwrap();
/// assert_eq!(first(&list).unwrap(), Value::Int(0));
/// ```
pub fn cons(first: Value, rest: Value) -> Result<Value> {
    let tail = match rest {
        Value::Nil | Value::Cons(_) | Value::LazySeq(_) => rest,
        other => seq(&other)?,
    };
    Ok(Value::Cons(ReferenceCounter::new(Cons::new(first, tail))))
}

/// Builds a lazy sequence from a producer.
///
/// The producer runs on first observation and may return nil, a cons, a
/// lazy seq, or any seqable collection.
pub fn lazy_seq<F>(producer: F) -> Value
where
    F: FnOnce() -> Result<Value> + 'static,
{
    Value::LazySeq(ReferenceCounter::new(LazySeq::new(producer)))
}

// =============================================================================
// The seq view
// =============================================================================

/// Coerces a value to its sequence view.
///
/// Returns nil for empty collections. Vectors (plain, specialized, sorted)
/// project lazily by index; maps and sets project their entries (each entry
/// a two-element vector), materializing the trie walk inside the first
/// forced cell; strings project their characters as one-character strings.
/// Cons cells and lazy seqs pass through unforced.
///
/// Fails with `UnsupportedOperation` for non-seqable values.
pub fn seq(value: &Value) -> Result<Value> {
    match value {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(_) | Value::LazySeq(_) => Ok(value.clone()),
        Value::Vector(vector) => Ok(vector_seq(vector.clone(), 0)),
        Value::SortedVector(sorted) => Ok(vector_seq(sorted.as_vector().clone(), 0)),
        Value::DoubleVector(vector) => Ok(double_vector_seq(vector.clone(), 0)),
        Value::IntVector(vector) => Ok(int_vector_seq(vector.clone(), 0)),
        Value::Map(map) => {
            if map.is_empty() {
                return Ok(Value::Nil);
            }
            let map = map.clone();
            Ok(lazy_seq(move || {
                let entries: Vec<Value> = map
                    .iter()
                    .map(|(key, value)| {
                        Value::Vector(
                            [key.clone(), value.clone()].into_iter().collect(),
                        )
                    })
                    .collect();
                Ok(list_of(entries))
            }))
        }
        Value::Set(set) => {
            if set.is_empty() {
                return Ok(Value::Nil);
            }
            let set = set.clone();
            Ok(lazy_seq(move || {
                let elements: Vec<Value> = set.iter().cloned().collect();
                Ok(list_of(elements))
            }))
        }
        Value::Str(text) => {
            if text.is_empty() {
                return Ok(Value::Nil);
            }
            Ok(string_seq(text.clone(), 0))
        }
        other => Err(PdsError::UnsupportedOperation {
            operation: "seq",
            target: other.kind(),
        }),
    }
}

/// Builds an eager cons chain from a vector of elements.
pub(crate) fn list_of(elements: Vec<Value>) -> Value {
    let mut result = Value::Nil;
    for element in elements.into_iter().rev() {
        result = Value::Cons(ReferenceCounter::new(Cons::new(element, result)));
    }
    result
}

/// Lazy index projection over a persistent vector.
fn vector_seq(vector: PersistentVector<Value>, index: usize) -> Value {
    if index >= vector.len() {
        return Value::Nil;
    }
    lazy_seq(move || {
        let Some(element) = vector.get(index).cloned() else {
            return Ok(Value::Nil);
        };
        let rest = vector_seq(vector, index + 1);
        Ok(Value::Cons(ReferenceCounter::new(Cons::new(element, rest))))
    })
}

/// Lazy index projection over a packed `f64` vector.
fn double_vector_seq(vector: PersistentVector<f64>, index: usize) -> Value {
    if index >= vector.len() {
        return Value::Nil;
    }
    lazy_seq(move || {
        let Some(element) = vector.get(index).copied() else {
            return Ok(Value::Nil);
        };
        let rest = double_vector_seq(vector, index + 1);
        Ok(Value::Cons(ReferenceCounter::new(Cons::new(
            Value::Float(element),
            rest,
        ))))
    })
}

/// Lazy index projection over a packed `i64` vector.
fn int_vector_seq(vector: PersistentVector<i64>, index: usize) -> Value {
    if index >= vector.len() {
        return Value::Nil;
    }
    lazy_seq(move || {
        let Some(element) = vector.get(index).copied() else {
            return Ok(Value::Nil);
        };
        let rest = int_vector_seq(vector, index + 1);
        Ok(Value::Cons(ReferenceCounter::new(Cons::new(
            Value::Int(element),
            rest,
        ))))
    })
}

/// Lazy projection over a string's characters, yielded as one-character
/// strings.
fn string_seq(text: ReferenceCounter<str>, byte_index: usize) -> Value {
    if byte_index >= text.len() {
        return Value::Nil;
    }
    lazy_seq(move || {
        let Some(character) = text[byte_index..].chars().next() else {
            return Ok(Value::Nil);
        };
        let rest = string_seq(text.clone(), byte_index + character.len_utf8());
        Ok(Value::Cons(ReferenceCounter::new(Cons::new(
            Value::string(&character.to_string()),
            rest,
        ))))
    })
}

// =============================================================================
// first / rest
// =============================================================================

/// Returns the first element of a sequence, or nil when it is empty.
///
/// Fails only when the value is not seqable.
pub fn first(value: &Value) -> Result<Value> {
    match value {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(cell) => Ok(cell.first().clone()),
        Value::LazySeq(lazy) => match lazy.force()? {
            Value::Cons(cell) => Ok(cell.first().clone()),
            _ => Ok(Value::Nil),
        },
        Value::Vector(vector) => Ok(vector.first().cloned().unwrap_or(Value::Nil)),
        other => first(&seq(other)?),
    }
}

/// Returns the rest of a sequence. Total over seqs: `rest(nil)` is nil, a
/// valid empty seq.
///
/// Fails only when the value is not seqable.
pub fn rest(value: &Value) -> Result<Value> {
    match value {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(cell) => Ok(cell.rest().clone()),
        Value::LazySeq(lazy) => match lazy.force()? {
            Value::Cons(cell) => Ok(cell.rest().clone()),
            _ => Ok(Value::Nil),
        },
        other => rest(&seq(other)?),
    }
}

// =============================================================================
// SeqIter
// =============================================================================

/// Iterator over any seqable value, yielding `Result` items because
/// forcing a lazy tail can surface an error.
///
/// # Examples
///
/// ```rust
/// use spork_pds::seq::{SeqIter, cons};
/// use spork_pds::value::Value;
///
/// let list = cons(Value::Int(1), Value::Nil).unwrap();
/// let items: Vec<Value> = SeqIter::new(list).map(Result::unwrap).collect();
/// assert_eq!(items, vec![Value::Int(1)]);
/// ```
pub struct SeqIter {
    current: Value,
}

impl SeqIter {
    /// Creates an iterator over a seqable value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { current: value }
    }

    /// Consumes the iterator, returning the unconsumed tail seq.
    #[must_use]
    pub fn into_rest(self) -> Value {
        self.current
    }
}

impl Iterator for SeqIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = std::mem::replace(&mut self.current, Value::Nil);
            match current {
                Value::Nil => return None,
                Value::Cons(cell) => {
                    self.current = cell.rest().clone();
                    return Some(Ok(cell.first().clone()));
                }
                Value::LazySeq(lazy) => match lazy.force() {
                    Ok(realized) => self.current = realized,
                    Err(error) => return Some(Err(error)),
                },
                other => match seq(&other) {
                    Ok(view) => self.current = view,
                    Err(error) => return Some(Err(error)),
                },
            }
        }
    }
}

/// Splits a seqable value into its first element and tail, or `None` when
/// empty. The workhorse of the combinator library: forces exactly one cell.
pub(crate) fn split_first(value: &Value) -> Result<Option<(Value, Value)>> {
    let mut iter = SeqIter::new(value.clone());
    match iter.next() {
        None => Ok(None),
        Some(Ok(element)) => Ok(Some((element, iter.into_rest()))),
        Some(Err(error)) => Err(error),
    }
}

// =============================================================================
// Cross-kind sequential semantics
// =============================================================================

/// Element-wise equality across any two sequential values. Errors while
/// forcing read as inequality.
pub(crate) fn sequential_equals(left: &Value, right: &Value) -> bool {
    if let (Value::Vector(first), Value::Vector(second)) = (left, right) {
        return first == second;
    }

    let mut left_iter = SeqIter::new(left.clone());
    let mut right_iter = SeqIter::new(right.clone());
    loop {
        match (left_iter.next(), right_iter.next()) {
            (None, None) => return true,
            (Some(Ok(first)), Some(Ok(second))) => {
                if first != second {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Lexicographic comparison across any two sequential values.
pub(crate) fn sequential_compare(left: &Value, right: &Value) -> Result<Ordering> {
    let mut left_iter = SeqIter::new(left.clone());
    let mut right_iter = SeqIter::new(right.clone());
    loop {
        match (left_iter.next(), right_iter.next()) {
            (None, None) => return Ok(Ordering::Equal),
            (None, Some(_)) => return Ok(Ordering::Less),
            (Some(_), None) => return Ok(Ordering::Greater),
            (Some(first), Some(second)) => {
                let ordering = compare(&first?, &second?)?;
                if ordering != Ordering::Equal {
                    return Ok(ordering);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
