//! Persistent vector kept ordered by a key function.
//!
//! This module provides [`SortedVector`], a [`PersistentVector`] of
//! [`Value`]s whose iteration order is always sorted by a configurable key
//! (identity if none), ascending unless reversed. It backs the `sorted-for`
//! builders of the language, so inserts are expected on small-to-medium
//! collections: the insertion point is found by binary search and the
//! element spliced in.
//!
//! Duplicate sort keys insert at the *first* equal position.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::persistent::SortedVector;
//! use spork_pds::value::Value;
//!
//! let sorted = SortedVector::new(None, false)
//!     .insert(Value::Int(3)).unwrap()
//!     .insert(Value::Int(1)).unwrap()
//!     .insert(Value::Int(2)).unwrap();
//!
//! let order: Vec<i64> = sorted
//!     .iter()
//!     .map(|element| match element {
//!         Value::Int(value) => *value,
//!         _ => unreachable!(),
//!     })
//!     .collect();
//! assert_eq!(order, vec![1, 2, 3]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{PersistentVector, PersistentVectorIterator, TransientVector};
use crate::error::Result;
use crate::value::{Value, compare};

/// The key function of a sorted vector: maps an element to the value it
/// sorts by.
pub type SortedKey = crate::value::ValueFn;

// =============================================================================
// SortedVector Definition
// =============================================================================

/// A persistent vector whose elements stay sorted by a key function.
///
/// # Time Complexity
///
/// | Operation  | Complexity                  |
/// |------------|-----------------------------|
/// | `insert`   | O(log N) search + O(N) splice |
/// | `get`      | O(log32 N)                  |
/// | `pop_last` | O(log32 N)                  |
/// | `len`      | O(1)                        |
#[derive(Clone)]
pub struct SortedVector {
    /// Elements, always in sorted order
    vector: PersistentVector<Value>,
    /// Sort key; identity when absent
    key: Option<SortedKey>,
    /// Descending order when set
    reverse: bool,
}

impl SortedVector {
    /// Creates an empty sorted vector with the given ordering
    /// configuration.
    #[must_use]
    pub fn new(key: Option<SortedKey>, reverse: bool) -> Self {
        Self {
            vector: PersistentVector::new(),
            key,
            reverse,
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vector.len()
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Returns the element at the given index in sort order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.vector.get(index)
    }

    /// Returns `true` when the order is descending.
    #[inline]
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Returns the key function, if one was configured.
    #[must_use]
    pub const fn key(&self) -> Option<&SortedKey> {
        self.key.as_ref()
    }

    /// Returns an iterator over the elements in sort order.
    #[must_use]
    pub fn iter(&self) -> PersistentVectorIterator<'_, Value> {
        self.vector.iter()
    }

    /// Returns the underlying persistent vector.
    #[must_use]
    pub const fn as_vector(&self) -> &PersistentVector<Value> {
        &self.vector
    }

    /// Returns an empty sorted vector with the same ordering
    /// configuration.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            vector: PersistentVector::new(),
            key: self.key.clone(),
            reverse: self.reverse,
        }
    }

    /// Compares two elements under the configured key and direction.
    fn compare_elements(&self, left: &Value, right: &Value) -> Result<Ordering> {
        let ordering = match &self.key {
            Some(key) => compare(&key(left), &key(right))?,
            None => compare(left, right)?,
        };
        Ok(if self.reverse {
            ordering.reverse()
        } else {
            ordering
        })
    }

    /// Finds the leftmost index whose element does not sort before
    /// `element` - the insertion point that puts `element` ahead of its
    /// equals.
    fn insertion_index(&self, element: &Value) -> Result<usize> {
        let mut low = 0;
        let mut high = self.vector.len();
        while low < high {
            let middle = low + (high - low) / 2;
            let ordering = match self.vector.get(middle) {
                Some(existing) => self.compare_elements(existing, element)?,
                None => Ordering::Greater,
            };
            if ordering == Ordering::Less {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        Ok(low)
    }

    /// Inserts an element at its sort position.
    ///
    /// Fails with `TypeMismatch` when the element's sort key is not
    /// comparable to the existing keys.
    ///
    /// # Complexity
    ///
    /// O(log N) search, O(N) splice
    pub fn insert(&self, element: Value) -> Result<Self> {
        let index = self.insertion_index(&element)?;

        let mut transient = TransientVector::new();
        for existing in self.vector.iter().take(index) {
            transient.push_back(existing.clone());
        }
        transient.push_back(element);
        for existing in self.vector.iter().skip(index) {
            transient.push_back(existing.clone());
        }

        Ok(Self {
            vector: transient.persistent(),
            key: self.key.clone(),
            reverse: self.reverse,
        })
    }

    /// Removes the last element in sort order.
    ///
    /// Returns `None` if the vector is empty.
    #[must_use]
    pub fn pop_last(&self) -> Option<(Self, Value)> {
        let (vector, element) = self.vector.pop_back()?;
        Some((
            Self {
                vector,
                key: self.key.clone(),
                reverse: self.reverse,
            },
            element,
        ))
    }
}

impl PartialEq for SortedVector {
    fn eq(&self, other: &Self) -> bool {
        // Configuration is invisible to equality; contents decide
        self.vector == other.vector
    }
}

impl Eq for SortedVector {}

impl fmt::Debug for SortedVector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.vector.iter()).finish()
    }
}

// =============================================================================
// TransientSortedVector Definition
// =============================================================================

/// A transient (mutable) builder for [`SortedVector`].
///
/// Inserts splice into a plain buffer; converting back rebuilds the trie in
/// O(N).
///
/// # Thread Safety
///
/// `TransientSortedVector` is intentionally not `Send` or `Sync`: it is a
/// single-owner builder.
pub struct TransientSortedVector {
    elements: Vec<Value>,
    key: Option<SortedKey>,
    reverse: bool,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

// Static assertions to verify TransientSortedVector is not Send/Sync
static_assertions::assert_not_impl_any!(TransientSortedVector: Send, Sync);

impl TransientSortedVector {
    /// Creates a builder from a persistent sorted vector.
    #[must_use]
    pub fn from_persistent(sorted: &SortedVector) -> Self {
        Self {
            elements: sorted.iter().cloned().collect(),
            key: sorted.key.clone(),
            reverse: sorted.reverse,
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the builder contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Compares two elements under the configured key and direction.
    fn compare_elements(&self, left: &Value, right: &Value) -> Result<Ordering> {
        let ordering = match &self.key {
            Some(key) => compare(&key(left), &key(right))?,
            None => compare(left, right)?,
        };
        Ok(if self.reverse {
            ordering.reverse()
        } else {
            ordering
        })
    }

    /// Inserts an element at its sort position (first equal position).
    pub fn insert(&mut self, element: Value) -> Result<()> {
        let mut low = 0;
        let mut high = self.elements.len();
        while low < high {
            let middle = low + (high - low) / 2;
            if self.compare_elements(&self.elements[middle], &element)? == Ordering::Less {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        self.elements.insert(low, element);
        Ok(())
    }

    /// Removes and returns the last element, or `None` if empty.
    pub fn pop_last(&mut self) -> Option<Value> {
        self.elements.pop()
    }

    /// Converts the builder into a persistent sorted vector, consuming it.
    #[must_use]
    pub fn persistent(self) -> SortedVector {
        SortedVector {
            vector: self.elements.into_iter().collect(),
            key: self.key,
            reverse: self.reverse,
        }
    }
}

impl fmt::Debug for TransientSortedVector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TransientSortedVector")
            .field("length", &self.elements.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
