//! The generic operation layer the code generator compiles against.
//!
//! One dispatch surface maps the protocol operations (`first`, `rest`,
//! `seq`, `count`, `nth`, `get`, `contains`, `conj`, `assoc`, `dissoc`,
//! `disj`, `empty`, `pop`, `into`) onto every collection kind, alongside
//! the construction factories (`vec`, `hash_map`, ...), the value-level
//! transient handle, and the eager half of the sequence library
//! (`reduce`, `group_by`, `frequencies`, ...). Dispatch is a `match` over
//! the [`Value`] tag.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::ops::{assoc, conj, get, nth, vec};
//! use spork_pds::value::Value;
//!
//! let v0 = vec((1..=5).map(Value::Int));
//! let v1 = assoc(&v0, Value::Int(2), Value::Int(99)).unwrap();
//!
//! assert_eq!(nth(&v0, 2, None).unwrap(), Value::Int(3));  // Original unchanged
//! assert_eq!(nth(&v1, 2, None).unwrap(), Value::Int(99)); // New version
//! assert_eq!(conj(&v0, Value::Int(6)).and_then(|v| nth(&v, 5, None)).unwrap(), Value::Int(6));
//! ```

use std::cmp::Ordering;

use crate::error::{PdsError, Result};
use crate::persistent::{
    PersistentHashMap, PersistentHashSet, PersistentVector, ReferenceCounter, SortedVector,
    TransientHashMap, TransientHashSet, TransientSortedVector, TransientVector,
};
use crate::seq::{Cons, SeqIter, cons, drop, drop_while, list_of, take, take_while};
use crate::value::{Value, ValueFn, ValueFn2, compare};

// =============================================================================
// Factories
// =============================================================================

/// Builds a vector from the given elements.
pub fn vec(elements: impl IntoIterator<Item = Value>) -> Value {
    let mut builder = TransientVector::new();
    for element in elements {
        builder.push_back(element);
    }
    Value::Vector(builder.persistent())
}

/// Builds a packed `f64` vector; every element must be a number.
pub fn vec_f64(elements: impl IntoIterator<Item = Value>) -> Result<Value> {
    let mut builder = TransientVector::new();
    for element in elements {
        match element.as_f64() {
            Some(number) => builder.push_back(number),
            None => {
                return Err(PdsError::TypeMismatch {
                    expected: "a number",
                    actual: element.kind(),
                });
            }
        }
    }
    Ok(Value::DoubleVector(builder.persistent()))
}

/// Builds a packed `i64` vector; every element must be an integer.
pub fn vec_i64(elements: impl IntoIterator<Item = Value>) -> Result<Value> {
    let mut builder = TransientVector::new();
    for element in elements {
        match element {
            Value::Int(number) => builder.push_back(number),
            other => {
                return Err(PdsError::TypeMismatch {
                    expected: "an integer",
                    actual: other.kind(),
                });
            }
        }
    }
    Ok(Value::IntVector(builder.persistent()))
}

/// Returns an empty sorted vector with the given ordering configuration.
#[must_use]
pub fn sorted_vec(key: Option<ValueFn>, reverse: bool) -> Value {
    Value::SortedVector(SortedVector::new(key, reverse))
}

/// Builds a map from alternating keys and values.
///
/// Fails with `ArityMismatch` on an odd number of arguments.
pub fn hash_map(entries: impl IntoIterator<Item = Value>) -> Result<Value> {
    let mut builder = TransientHashMap::new();
    let mut iterator = entries.into_iter();
    while let Some(key) = iterator.next() {
        let Some(value) = iterator.next() else {
            return Err(PdsError::ArityMismatch {
                operation: "hash-map",
                expected: "an even number of arguments",
            });
        };
        builder.insert(key, value);
    }
    Ok(Value::Map(builder.persistent()))
}

/// Builds a set from the given elements.
pub fn hash_set(elements: impl IntoIterator<Item = Value>) -> Value {
    let mut builder = TransientHashSet::new();
    for element in elements {
        builder.insert(element);
    }
    Value::Set(builder.persistent())
}

/// The canonical empty vector.
#[must_use]
pub fn empty_vector() -> Value {
    Value::Vector(PersistentVector::new())
}

/// The canonical empty map.
#[must_use]
pub fn empty_map() -> Value {
    Value::Map(PersistentHashMap::new())
}

/// The canonical empty set.
#[must_use]
pub fn empty_set() -> Value {
    Value::Set(PersistentHashSet::new())
}

// =============================================================================
// Protocol operations
// =============================================================================

/// Counts the elements of a collection or sequence. Counting a lazy
/// sequence realizes it.
pub fn count(coll: &Value) -> Result<usize> {
    match coll {
        Value::Nil => Ok(0),
        Value::Vector(vector) => Ok(vector.len()),
        Value::DoubleVector(vector) => Ok(vector.len()),
        Value::IntVector(vector) => Ok(vector.len()),
        Value::SortedVector(sorted) => Ok(sorted.len()),
        Value::Map(map) => Ok(map.len()),
        Value::Set(set) => Ok(set.len()),
        Value::Str(text) => Ok(text.chars().count()),
        Value::Cons(_) | Value::LazySeq(_) => {
            let mut total = 0;
            for item in SeqIter::new(coll.clone()) {
                item?;
                total += 1;
            }
            Ok(total)
        }
        other => Err(PdsError::UnsupportedOperation {
            operation: "count",
            target: other.kind(),
        }),
    }
}

/// Looks up the element at `index`.
///
/// O(log32 N) on vectors, O(n) on sequences. Negative indices fail with
/// `IndexOutOfRange`; maps and sets fail with `UnsupportedOperation`. With
/// an explicit default, out-of-range lookups return the default instead of
/// failing.
pub fn nth(coll: &Value, index: i64, default: Option<Value>) -> Result<Value> {
    match coll {
        Value::Vector(vector) => {
            nth_indexed(index, vector.len(), default, |position| {
                vector.get(position).cloned()
            })
        }
        Value::DoubleVector(vector) => {
            nth_indexed(index, vector.len(), default, |position| {
                vector.get(position).map(|number| Value::Float(*number))
            })
        }
        Value::IntVector(vector) => {
            nth_indexed(index, vector.len(), default, |position| {
                vector.get(position).map(|number| Value::Int(*number))
            })
        }
        Value::SortedVector(sorted) => {
            nth_indexed(index, sorted.len(), default, |position| {
                sorted.get(position).cloned()
            })
        }
        Value::Str(text) => {
            let length = text.chars().count();
            nth_indexed(index, length, default, |position| {
                text.chars()
                    .nth(position)
                    .map(|character| Value::string(&character.to_string()))
            })
        }
        Value::Nil | Value::Cons(_) | Value::LazySeq(_) => nth_seq(coll, index, default),
        other => Err(PdsError::UnsupportedOperation {
            operation: "nth",
            target: other.kind(),
        }),
    }
}

fn nth_indexed(
    index: i64,
    length: usize,
    default: Option<Value>,
    getter: impl Fn(usize) -> Option<Value>,
) -> Result<Value> {
    let found = usize::try_from(index).ok().and_then(getter);
    match found {
        Some(value) => Ok(value),
        None => default.map_or(Err(PdsError::IndexOutOfRange { index, length }), Ok),
    }
}

fn nth_seq(coll: &Value, index: i64, default: Option<Value>) -> Result<Value> {
    if index < 0 {
        return default.map_or(Err(PdsError::IndexOutOfRange { index, length: 0 }), Ok);
    }

    let mut walked: usize = 0;
    for item in SeqIter::new(coll.clone()) {
        let element = item?;
        if walked as i64 == index {
            return Ok(element);
        }
        walked += 1;
    }
    default.map_or(
        Err(PdsError::IndexOutOfRange {
            index,
            length: walked,
        }),
        Ok,
    )
}

/// Looks up a key, returning the default (or nil) when absent.
///
/// Maps look up by key, sets return their stored element, vectors and
/// strings index by number. `get` is total: any other target returns the
/// default.
#[must_use]
pub fn get(coll: &Value, key: &Value, default: Option<Value>) -> Value {
    let fallback = || default.clone().unwrap_or(Value::Nil);
    match coll {
        Value::Map(map) => map.get(key).cloned().unwrap_or_else(fallback),
        Value::Set(set) => set.get(key).cloned().unwrap_or_else(fallback),
        Value::Vector(vector) => index_of(key)
            .and_then(|position| vector.get(position).cloned())
            .unwrap_or_else(fallback),
        Value::DoubleVector(vector) => index_of(key)
            .and_then(|position| vector.get(position).map(|number| Value::Float(*number)))
            .unwrap_or_else(fallback),
        Value::IntVector(vector) => index_of(key)
            .and_then(|position| vector.get(position).map(|number| Value::Int(*number)))
            .unwrap_or_else(fallback),
        Value::SortedVector(sorted) => index_of(key)
            .and_then(|position| sorted.get(position).cloned())
            .unwrap_or_else(fallback),
        Value::Str(text) => index_of(key)
            .and_then(|position| text.chars().nth(position))
            .map_or_else(fallback, |character| Value::string(&character.to_string())),
        _ => fallback(),
    }
}

/// Interprets a value as a non-negative index.
fn index_of(key: &Value) -> Option<usize> {
    key.as_i64().and_then(|index| usize::try_from(index).ok())
}

/// Membership test: a key for maps, an element for sets, an in-range index
/// for vectors and strings.
pub fn contains(coll: &Value, key: &Value) -> Result<bool> {
    match coll {
        Value::Nil => Ok(false),
        Value::Map(map) => Ok(map.contains_key(key)),
        Value::Set(set) => Ok(set.contains(key)),
        Value::Vector(vector) => Ok(index_of(key).is_some_and(|index| index < vector.len())),
        Value::DoubleVector(vector) => {
            Ok(index_of(key).is_some_and(|index| index < vector.len()))
        }
        Value::IntVector(vector) => Ok(index_of(key).is_some_and(|index| index < vector.len())),
        Value::SortedVector(sorted) => Ok(index_of(key).is_some_and(|index| index < sorted.len())),
        Value::Str(text) => Ok(index_of(key).is_some_and(|index| index < text.chars().count())),
        other => Err(PdsError::UnsupportedOperation {
            operation: "contains?",
            target: other.kind(),
        }),
    }
}

/// Adds an element the way the collection grows: append for vectors,
/// ordered insert for sorted vectors, entry insert for maps, membership for
/// sets, prepend for sequences (and nil).
pub fn conj(coll: &Value, element: Value) -> Result<Value> {
    match coll {
        Value::Nil => cons(element, Value::Nil),
        Value::Vector(vector) => Ok(Value::Vector(vector.push_back(element))),
        Value::DoubleVector(vector) => match element.as_f64() {
            Some(number) => Ok(Value::DoubleVector(vector.push_back(number))),
            None => Err(PdsError::TypeMismatch {
                expected: "a number",
                actual: element.kind(),
            }),
        },
        Value::IntVector(vector) => match element {
            Value::Int(number) => Ok(Value::IntVector(vector.push_back(number))),
            other => Err(PdsError::TypeMismatch {
                expected: "an integer",
                actual: other.kind(),
            }),
        },
        Value::SortedVector(sorted) => Ok(Value::SortedVector(sorted.insert(element)?)),
        Value::Map(map) => conj_map_entry(map, element),
        Value::Set(set) => Ok(Value::Set(set.insert(element))),
        Value::Cons(_) | Value::LazySeq(_) => cons(element, coll.clone()),
        other => Err(PdsError::UnsupportedOperation {
            operation: "conj",
            target: other.kind(),
        }),
    }
}

fn conj_map_entry(map: &PersistentHashMap<Value, Value>, entry: Value) -> Result<Value> {
    match entry {
        Value::Vector(pair) => {
            if pair.len() != 2 {
                return Err(PdsError::ArityMismatch {
                    operation: "conj",
                    expected: "a two-element [key value] entry",
                });
            }
            let key = pair.get(0).cloned().unwrap_or(Value::Nil);
            let value = pair.get(1).cloned().unwrap_or(Value::Nil);
            Ok(Value::Map(map.insert(key, value)))
        }
        Value::Map(other) => Ok(Value::Map(map.merge(&other))),
        other => Err(PdsError::TypeMismatch {
            expected: "a [key value] entry or a map",
            actual: other.kind(),
        }),
    }
}

/// Associates a key with a value: map keys, or vector indices where
/// `index == count` appends. Assoc on nil builds a map.
pub fn assoc(coll: &Value, key: Value, value: Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Map(PersistentHashMap::singleton(key, value))),
        Value::Map(map) => Ok(Value::Map(map.insert(key, value))),
        Value::Vector(vector) => {
            let index = assoc_index(&key)?;
            assoc_vector(vector, index, value).map(Value::Vector)
        }
        Value::DoubleVector(vector) => {
            let index = assoc_index(&key)?;
            let Some(number) = value.as_f64() else {
                return Err(PdsError::TypeMismatch {
                    expected: "a number",
                    actual: value.kind(),
                });
            };
            assoc_vector(vector, index, number).map(Value::DoubleVector)
        }
        Value::IntVector(vector) => {
            let index = assoc_index(&key)?;
            let Value::Int(number) = value else {
                return Err(PdsError::TypeMismatch {
                    expected: "an integer",
                    actual: value.kind(),
                });
            };
            assoc_vector(vector, index, number).map(Value::IntVector)
        }
        other => Err(PdsError::UnsupportedOperation {
            operation: "assoc",
            target: other.kind(),
        }),
    }
}

fn assoc_index(key: &Value) -> Result<i64> {
    key.as_i64().ok_or(PdsError::TypeMismatch {
        expected: "an integer index",
        actual: key.kind(),
    })
}

fn assoc_vector<T: Clone>(
    vector: &PersistentVector<T>,
    index: i64,
    element: T,
) -> Result<PersistentVector<T>> {
    let length = vector.len();
    let Ok(position) = usize::try_from(index) else {
        return Err(PdsError::IndexOutOfRange { index, length });
    };
    if position == length {
        Ok(vector.push_back(element))
    } else {
        vector
            .update(position, element)
            .ok_or(PdsError::IndexOutOfRange { index, length })
    }
}

/// Removes a key from a map. Dissoc on nil is nil.
pub fn dissoc(coll: &Value, key: &Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Map(map) => Ok(Value::Map(map.remove(key))),
        other => Err(PdsError::UnsupportedOperation {
            operation: "dissoc",
            target: other.kind(),
        }),
    }
}

/// Removes an element from a set. Disj on nil is nil.
pub fn disj(coll: &Value, element: &Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Set(set) => Ok(Value::Set(set.remove(element))),
        other => Err(PdsError::UnsupportedOperation {
            operation: "disj",
            target: other.kind(),
        }),
    }
}

/// Returns the empty collection of the same kind; a sorted vector keeps
/// its ordering configuration, sequences empty to nil.
pub fn empty(coll: &Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Vector(_) => Ok(empty_vector()),
        Value::DoubleVector(_) => Ok(Value::DoubleVector(PersistentVector::new())),
        Value::IntVector(_) => Ok(Value::IntVector(PersistentVector::new())),
        Value::SortedVector(sorted) => Ok(Value::SortedVector(sorted.empty_like())),
        Value::Map(_) => Ok(empty_map()),
        Value::Set(_) => Ok(empty_set()),
        Value::Cons(_) | Value::LazySeq(_) => Ok(Value::Nil),
        other => Err(PdsError::UnsupportedOperation {
            operation: "empty",
            target: other.kind(),
        }),
    }
}

/// Removes the last element of a vector. Popping an empty vector fails.
pub fn pop(coll: &Value) -> Result<Value> {
    let empty_pop = || PdsError::IndexOutOfRange {
        index: 0,
        length: 0,
    };
    match coll {
        Value::Vector(vector) => vector
            .pop_back()
            .map(|(rest, _)| Value::Vector(rest))
            .ok_or_else(empty_pop),
        Value::DoubleVector(vector) => vector
            .pop_back()
            .map(|(rest, _)| Value::DoubleVector(rest))
            .ok_or_else(empty_pop),
        Value::IntVector(vector) => vector
            .pop_back()
            .map(|(rest, _)| Value::IntVector(rest))
            .ok_or_else(empty_pop),
        Value::SortedVector(sorted) => sorted
            .pop_last()
            .map(|(rest, _)| Value::SortedVector(rest))
            .ok_or_else(empty_pop),
        other => Err(PdsError::UnsupportedOperation {
            operation: "pop",
            target: other.kind(),
        }),
    }
}

/// Pours every element of `source` into `target`, using a transient of the
/// target's kind when it has one.
pub fn into(target: &Value, source: &Value) -> Result<Value> {
    match transient(target) {
        Ok(mut builder) => {
            for item in SeqIter::new(source.clone()) {
                builder.conj_mut(item?)?;
            }
            builder.persistent()
        }
        Err(_) => {
            // Sequence targets grow by prepending
            let mut result = target.clone();
            for item in SeqIter::new(source.clone()) {
                result = conj(&result, item?)?;
            }
            Ok(result)
        }
    }
}

// =============================================================================
// Transients
// =============================================================================

/// A value-level transient: the single-owner mutable handle the compiled
/// `transient`/`persistent!` forms operate on.
///
/// After [`persistent`](Transient::persistent) the handle is invalidated
/// and every operation fails with `TransientUsedAfterPersistent`. A failing
/// operation never disturbs the builder's contents.
#[derive(Debug)]
pub enum Transient {
    /// Builder for a vector.
    Vector(TransientVector<Value>),
    /// Builder for a packed `f64` vector.
    DoubleVector(TransientVector<f64>),
    /// Builder for a packed `i64` vector.
    IntVector(TransientVector<i64>),
    /// Builder for a sorted vector.
    SortedVector(TransientSortedVector),
    /// Builder for a map.
    Map(TransientHashMap<Value, Value>),
    /// Builder for a set.
    Set(TransientHashSet<Value>),
    /// The spent state left behind by `persistent`.
    Invalidated,
}

/// Creates a transient builder from a persistent collection in O(1).
pub fn transient(coll: &Value) -> Result<Transient> {
    match coll {
        Value::Vector(vector) => Ok(Transient::Vector(TransientVector::from_persistent(
            vector.clone(),
        ))),
        Value::DoubleVector(vector) => Ok(Transient::DoubleVector(
            TransientVector::from_persistent(vector.clone()),
        )),
        Value::IntVector(vector) => Ok(Transient::IntVector(TransientVector::from_persistent(
            vector.clone(),
        ))),
        Value::SortedVector(sorted) => Ok(Transient::SortedVector(
            TransientSortedVector::from_persistent(sorted),
        )),
        Value::Map(map) => Ok(Transient::Map(TransientHashMap::from_persistent(
            map.clone(),
        ))),
        Value::Set(set) => Ok(Transient::Set(TransientHashSet::from_persistent(
            set.clone(),
        ))),
        other => Err(PdsError::UnsupportedOperation {
            operation: "transient",
            target: other.kind(),
        }),
    }
}

impl Transient {
    /// Returns the number of elements in the builder.
    pub fn len(&self) -> Result<usize> {
        match self {
            Self::Vector(builder) => Ok(builder.len()),
            Self::DoubleVector(builder) => Ok(builder.len()),
            Self::IntVector(builder) => Ok(builder.len()),
            Self::SortedVector(builder) => Ok(builder.len()),
            Self::Map(builder) => Ok(builder.len()),
            Self::Set(builder) => Ok(builder.len()),
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
        }
    }

    /// Returns `true` if the builder contains no elements.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Adds an element, with the same kind-specific semantics as
    /// [`conj`].
    pub fn conj_mut(&mut self, element: Value) -> Result<()> {
        match self {
            Self::Vector(builder) => {
                builder.push_back(element);
                Ok(())
            }
            Self::DoubleVector(builder) => match element.as_f64() {
                Some(number) => {
                    builder.push_back(number);
                    Ok(())
                }
                None => Err(PdsError::TypeMismatch {
                    expected: "a number",
                    actual: element.kind(),
                }),
            },
            Self::IntVector(builder) => match element {
                Value::Int(number) => {
                    builder.push_back(number);
                    Ok(())
                }
                other => Err(PdsError::TypeMismatch {
                    expected: "an integer",
                    actual: other.kind(),
                }),
            },
            Self::SortedVector(builder) => builder.insert(element),
            Self::Map(builder) => match element {
                Value::Vector(pair) if pair.len() == 2 => {
                    let key = pair.get(0).cloned().unwrap_or(Value::Nil);
                    let value = pair.get(1).cloned().unwrap_or(Value::Nil);
                    builder.insert(key, value);
                    Ok(())
                }
                Value::Vector(_) => Err(PdsError::ArityMismatch {
                    operation: "conj!",
                    expected: "a two-element [key value] entry",
                }),
                other => Err(PdsError::TypeMismatch {
                    expected: "a [key value] entry",
                    actual: other.kind(),
                }),
            },
            Self::Set(builder) => {
                builder.insert(element);
                Ok(())
            }
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
        }
    }

    /// Associates a key with a value: map keys, or vector indices where
    /// `index == count` appends.
    pub fn assoc_mut(&mut self, key: Value, value: Value) -> Result<()> {
        match self {
            Self::Vector(builder) => {
                let index = assoc_index(&key)?;
                transient_vector_assoc(builder, index, value)
            }
            Self::DoubleVector(builder) => {
                let index = assoc_index(&key)?;
                let Some(number) = value.as_f64() else {
                    return Err(PdsError::TypeMismatch {
                        expected: "a number",
                        actual: value.kind(),
                    });
                };
                transient_vector_assoc(builder, index, number)
            }
            Self::IntVector(builder) => {
                let index = assoc_index(&key)?;
                let Value::Int(number) = value else {
                    return Err(PdsError::TypeMismatch {
                        expected: "an integer",
                        actual: value.kind(),
                    });
                };
                transient_vector_assoc(builder, index, number)
            }
            Self::Map(builder) => {
                builder.insert(key, value);
                Ok(())
            }
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
            other => Err(PdsError::UnsupportedOperation {
                operation: "assoc!",
                target: other.kind_name(),
            }),
        }
    }

    /// Removes a key from a map builder.
    pub fn dissoc_mut(&mut self, key: &Value) -> Result<()> {
        match self {
            Self::Map(builder) => {
                builder.remove(key);
                Ok(())
            }
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
            other => Err(PdsError::UnsupportedOperation {
                operation: "dissoc!",
                target: other.kind_name(),
            }),
        }
    }

    /// Removes an element from a set builder.
    pub fn disj_mut(&mut self, element: &Value) -> Result<()> {
        match self {
            Self::Set(builder) => {
                builder.remove(element);
                Ok(())
            }
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
            other => Err(PdsError::UnsupportedOperation {
                operation: "disj!",
                target: other.kind_name(),
            }),
        }
    }

    /// Removes and returns the last element of a vector builder.
    pub fn pop_mut(&mut self) -> Result<Value> {
        let empty_pop = || PdsError::IndexOutOfRange {
            index: 0,
            length: 0,
        };
        match self {
            Self::Vector(builder) => builder.pop_back().ok_or_else(empty_pop),
            Self::DoubleVector(builder) => {
                builder.pop_back().map(Value::Float).ok_or_else(empty_pop)
            }
            Self::IntVector(builder) => builder.pop_back().map(Value::Int).ok_or_else(empty_pop),
            Self::SortedVector(builder) => builder.pop_last().ok_or_else(empty_pop),
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
            other => Err(PdsError::UnsupportedOperation {
                operation: "pop!",
                target: other.kind_name(),
            }),
        }
    }

    /// Freezes the builder into its persistent collection, leaving the
    /// handle invalidated: every later operation fails.
    pub fn persistent(&mut self) -> Result<Value> {
        match std::mem::replace(self, Self::Invalidated) {
            Self::Vector(builder) => Ok(Value::Vector(builder.persistent())),
            Self::DoubleVector(builder) => Ok(Value::DoubleVector(builder.persistent())),
            Self::IntVector(builder) => Ok(Value::IntVector(builder.persistent())),
            Self::SortedVector(builder) => Ok(Value::SortedVector(builder.persistent())),
            Self::Map(builder) => Ok(Value::Map(builder.persistent())),
            Self::Set(builder) => Ok(Value::Set(builder.persistent())),
            Self::Invalidated => Err(PdsError::TransientUsedAfterPersistent),
        }
    }

    const fn kind_name(&self) -> &'static str {
        match self {
            Self::Vector(_) => "vector transient",
            Self::DoubleVector(_) => "double-vector transient",
            Self::IntVector(_) => "int-vector transient",
            Self::SortedVector(_) => "sorted-vector transient",
            Self::Map(_) => "map transient",
            Self::Set(_) => "set transient",
            Self::Invalidated => "invalidated transient",
        }
    }
}

fn transient_vector_assoc<T: Clone>(
    builder: &mut TransientVector<T>,
    index: i64,
    element: T,
) -> Result<()> {
    let length = builder.len();
    let Ok(position) = usize::try_from(index) else {
        return Err(PdsError::IndexOutOfRange { index, length });
    };
    if position == length {
        builder.push_back(element);
        Ok(())
    } else if builder.update(position, element) {
        Ok(())
    } else {
        Err(PdsError::IndexOutOfRange { index, length })
    }
}

// =============================================================================
// Eager sequence library
// =============================================================================

/// Left-folds a function over a sequence. Without an init, the first
/// element seeds the fold; reducing an empty sequence without an init
/// yields nil.
pub fn reduce(function: &ValueFn2, init: Option<Value>, coll: &Value) -> Result<Value> {
    let mut iterator = SeqIter::new(coll.clone());
    let mut accumulated = match init {
        Some(value) => value,
        None => match iterator.next() {
            None => return Ok(Value::Nil),
            Some(item) => item?,
        },
    };
    for item in iterator {
        let element = item?;
        accumulated = function(&accumulated, &element);
    }
    Ok(accumulated)
}

/// Returns the first truthy result of the predicate, or nil.
pub fn some(predicate: &ValueFn, coll: &Value) -> Result<Value> {
    for item in SeqIter::new(coll.clone()) {
        let element = item?;
        let result = predicate(&element);
        if result.is_truthy() {
            return Ok(result);
        }
    }
    Ok(Value::Nil)
}

/// Returns `true` when the predicate is truthy for every element.
pub fn every(predicate: &ValueFn, coll: &Value) -> Result<bool> {
    for item in SeqIter::new(coll.clone()) {
        let element = item?;
        if !predicate(&element).is_truthy() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Complement of [`every`].
pub fn not_every(predicate: &ValueFn, coll: &Value) -> Result<bool> {
    Ok(!every(predicate, coll)?)
}

/// Returns `true` when the predicate is truthy for no element.
pub fn not_any(predicate: &ValueFn, coll: &Value) -> Result<bool> {
    Ok(some(predicate, coll)?.is_nil())
}

/// Reverses a sequence into an eager list.
pub fn reverse(coll: &Value) -> Result<Value> {
    let mut result = Value::Nil;
    for item in SeqIter::new(coll.clone()) {
        result = Value::Cons(ReferenceCounter::new(Cons::new(item?, result)));
    }
    Ok(result)
}

/// Sorts a sequence into an eager list using the value ordering.
pub fn sort(coll: &Value) -> Result<Value> {
    sort_with(None, coll)
}

/// Sorts a sequence into an eager list by a key function.
pub fn sort_by(key: &ValueFn, coll: &Value) -> Result<Value> {
    sort_with(Some(key), coll)
}

fn sort_with(key: Option<&ValueFn>, coll: &Value) -> Result<Value> {
    let mut elements = Vec::new();
    for item in SeqIter::new(coll.clone()) {
        elements.push(item?);
    }

    let mut failure: Option<PdsError> = None;
    elements.sort_by(|left, right| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        let ordering = match key {
            Some(function) => compare(&function(left), &function(right)),
            None => compare(left, right),
        };
        ordering.unwrap_or_else(|error| {
            failure = Some(error);
            Ordering::Equal
        })
    });

    match failure {
        Some(error) => Err(error),
        None => Ok(list_of(elements)),
    }
}

/// Splits a sequence at an index into `[taken dropped]`, both lazy.
#[must_use]
pub fn split_at(index: usize, coll: &Value) -> Value {
    Value::Vector([take(index, coll), drop(index, coll)].into_iter().collect())
}

/// Splits a sequence at the first non-matching element into
/// `[taken dropped]`, both lazy.
#[must_use]
pub fn split_with(predicate: &ValueFn, coll: &Value) -> Value {
    Value::Vector(
        [
            take_while(predicate.clone(), coll),
            drop_while(predicate.clone(), coll),
        ]
        .into_iter()
        .collect(),
    )
}

/// Builds a map from parallel key and value sequences, ending with the
/// shorter.
pub fn zipmap(keys: &Value, values: &Value) -> Result<Value> {
    let mut builder = TransientHashMap::new();
    let mut key_iterator = SeqIter::new(keys.clone());
    let mut value_iterator = SeqIter::new(values.clone());
    while let (Some(key), Some(value)) = (key_iterator.next(), value_iterator.next()) {
        builder.insert(key?, value?);
    }
    Ok(Value::Map(builder.persistent()))
}

/// Groups elements by a key function into a map of vectors.
pub fn group_by(function: &ValueFn, coll: &Value) -> Result<Value> {
    let mut builder: TransientHashMap<Value, Value> = TransientHashMap::new();
    for item in SeqIter::new(coll.clone()) {
        let element = item?;
        let key = function(&element);
        let group = match builder.get(&key).cloned() {
            Some(Value::Vector(vector)) => Value::Vector(vector.push_back(element)),
            _ => Value::Vector(PersistentVector::singleton(element)),
        };
        builder.insert(key, group);
    }
    Ok(Value::Map(builder.persistent()))
}

/// Counts occurrences of each distinct element into a map.
pub fn frequencies(coll: &Value) -> Result<Value> {
    let mut builder: TransientHashMap<Value, Value> = TransientHashMap::new();
    for item in SeqIter::new(coll.clone()) {
        let element = item?;
        let updated = match builder.get(&element) {
            Some(Value::Int(current)) => Value::Int(current + 1),
            _ => Value::Int(1),
        };
        builder.insert(element, updated);
    }
    Ok(Value::Map(builder.persistent()))
}

/// Realizes a lazy sequence completely and returns it.
pub fn doall(coll: &Value) -> Result<Value> {
    for item in SeqIter::new(coll.clone()) {
        item?;
    }
    Ok(coll.clone())
}

/// Realizes a lazy sequence completely for its effects.
pub fn dorun(coll: &Value) -> Result<()> {
    for item in SeqIter::new(coll.clone()) {
        item?;
    }
    Ok(())
}

/// Whether a lazy sequence's first cell has been realized.
pub fn realized(coll: &Value) -> Result<bool> {
    match coll {
        Value::LazySeq(lazy) => Ok(lazy.is_realized()),
        other => Err(PdsError::UnsupportedOperation {
            operation: "realized?",
            target: other.kind(),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================
