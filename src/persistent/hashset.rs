//! Persistent (immutable) hash set.
//!
//! This module provides [`PersistentHashSet`], an immutable hash set
//! layered over [`PersistentHashMap`] with `()` values, and
//! [`TransientHashSet`], its single-owner mutable builder.
//!
//! # Overview
//!
//! - O(log32 N) contains (effectively O(1) for practical sizes)
//! - O(log32 N) insert
//! - O(log32 N) remove
//! - O(1) len and `is_empty`
//!
//! All operations return new sets without modifying the original,
//! and structural sharing ensures memory efficiency.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::persistent::PersistentHashSet;
//!
//! let set = PersistentHashSet::new().insert(1).insert(2).insert(3);
//! assert!(set.contains(&1));
//!
//! // Structural sharing: the original set is preserved
//! let updated = set.insert(4);
//! assert_eq!(set.len(), 3);      // Original unchanged
//! assert_eq!(updated.len(), 4);  // New version
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::hashmap::compute_hash;
use super::{PersistentHashMap, TransientHashMap};

// =============================================================================
// PersistentHashSet Definition
// =============================================================================

/// A persistent (immutable) hash set based on [`PersistentHashMap`].
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `contains`     | O(log32 N)        |
/// | `insert`       | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `is_empty`     | O(1)              |
///
/// # Examples
///
/// ```rust
/// use spork_pds::persistent::PersistentHashSet;
///
/// let set = PersistentHashSet::singleton(42);
/// assert!(set.contains(&42));
/// assert!(!set.contains(&0));
/// ```
#[derive(Clone)]
pub struct PersistentHashSet<T> {
    /// Internal hash map with () as value type
    inner: PersistentHashMap<T, ()>,
}

impl<T> PersistentHashSet<T> {
    /// Creates a new empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: PersistentHashMap::new(),
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Clone + Hash + Eq> PersistentHashSet<T> {
    /// Creates a set containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().insert(element)
    }

    /// Returns `true` if the set contains the given element.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Returns the stored element equal to the given one.
    ///
    /// Useful when the set is queried with a borrowed form and the caller
    /// needs the owned representative back.
    #[must_use]
    pub fn get<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get_key_value(element).map(|(stored, ())| stored)
    }

    /// Adds an element to the set.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spork_pds::persistent::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::new().insert(1);
    /// assert!(set.contains(&1));
    /// assert_eq!(set.insert(1).len(), 1); // Already present
    /// ```
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        Self {
            inner: self.inner.insert(element, ()),
        }
    }

    /// Removes an element from the set.
    ///
    /// Returns the same set when the element is absent.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    #[must_use]
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self {
            inner: self.inner.remove(element),
        }
    }

    /// Returns the union of this set and another.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let (larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut transient = TransientHashSet::from_persistent(larger.clone());
        for element in smaller.iter() {
            transient.insert(element.clone());
        }
        transient.persistent()
    }

    /// Returns the intersection of this set and another.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller
            .iter()
            .filter(|element| larger.contains(element))
            .cloned()
            .collect()
    }

    /// Returns the elements of this set that are not in the other.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.iter()
            .filter(|element| !other.contains(element))
            .cloned()
            .collect()
    }

    /// Returns `true` if every element of this set is in the other.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|element| other.contains(element))
    }

    /// Returns an iterator over the elements.
    ///
    /// The order is deterministic for a given set but unspecified across
    /// versions.
    #[must_use]
    pub fn iter(&self) -> PersistentHashSetIterator<'_, T> {
        PersistentHashSetIterator {
            inner: self.inner.iter(),
        }
    }
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// An iterator over elements of a [`PersistentHashSet`].
pub struct PersistentHashSetIterator<'a, T> {
    inner: super::PersistentHashMapIterator<'a, T, ()>,
}

impl<'a, T> Iterator for PersistentHashSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for PersistentHashSetIterator<'_, T> {}

/// An owning iterator over elements of a [`PersistentHashSet`].
pub struct PersistentHashSetIntoIterator<T> {
    inner: super::PersistentHashMapIntoIterator<T, ()>,
}

impl<T> Iterator for PersistentHashSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for PersistentHashSetIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentHashSet<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for PersistentHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut transient = TransientHashSet::new();
        for element in iter {
            transient.insert(element);
        }
        transient.persistent()
    }
}

impl<T: Clone + Hash + Eq> IntoIterator for PersistentHashSet<T> {
    type Item = T;
    type IntoIter = PersistentHashSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentHashSetIntoIterator {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a, T: Clone + Hash + Eq> IntoIterator for &'a PersistentHashSet<T> {
    type Item = &'a T;
    type IntoIter = PersistentHashSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + Hash + Eq> PartialEq for PersistentHashSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|element| other.contains(element))
    }
}

impl<T: Clone + Hash + Eq> Eq for PersistentHashSet<T> {}

impl<T: Clone + Hash + Eq> Hash for PersistentHashSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: the wrapping sum of element hashes
        let mut sum: u32 = 0;
        for element in self.iter() {
            sum = sum.wrapping_add(compute_hash(element));
        }
        state.write_usize(self.len());
        state.write_u32(sum);
    }
}

impl<T: Clone + Hash + Eq + fmt::Debug> fmt::Debug for PersistentHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

// =============================================================================
// TransientHashSet Definition
// =============================================================================

/// A transient (mutable) version of [`PersistentHashSet`] for batch
/// construction.
///
/// # Thread Safety
///
/// `TransientHashSet` is intentionally not `Send` or `Sync`: it is a
/// single-owner builder.
///
/// # Examples
///
/// ```rust
/// use spork_pds::persistent::TransientHashSet;
///
/// let mut transient = TransientHashSet::new();
/// for element in 0..100 {
///     transient.insert(element % 10);
/// }
/// let set = transient.persistent();
/// assert_eq!(set.len(), 10);
/// ```
pub struct TransientHashSet<T> {
    inner: TransientHashMap<T, ()>,
}

// Static assertions to verify TransientHashSet is not Send/Sync
static_assertions::assert_not_impl_any!(TransientHashSet<i32>: Send, Sync);
static_assertions::assert_not_impl_any!(TransientHashSet<String>: Send, Sync);

impl<T> TransientHashSet<T> {
    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the builder contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Clone + Hash + Eq> TransientHashSet<T> {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: TransientHashMap::new(),
        }
    }

    /// Creates a builder from a persistent set.
    ///
    /// # Complexity
    ///
    /// O(1) - shares the root
    #[must_use]
    pub fn from_persistent(set: PersistentHashSet<T>) -> Self {
        Self {
            inner: TransientHashMap::from_persistent(set.inner),
        }
    }

    /// Returns `true` if the builder contains the given element.
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Adds an element, returning `true` if it was newly added.
    pub fn insert(&mut self, element: T) -> bool {
        self.inner.insert(element, ()).is_none()
    }

    /// Removes an element, returning `true` if it was present.
    pub fn remove<Q>(&mut self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(element).is_some()
    }

    /// Converts the builder into a persistent set, consuming it.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn persistent(self) -> PersistentHashSet<T> {
        PersistentHashSet {
            inner: self.inner.persistent(),
        }
    }
}

impl<T: Clone + Hash + Eq> Default for TransientHashSet<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TransientHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TransientHashSet")
            .field("length", &self.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Rayon Parallel Iterator
// =============================================================================

#[cfg(feature = "rayon")]
mod rayon_impl {
    use super::PersistentHashSet;
    use rayon::iter::plumbing::UnindexedConsumer;
    use rayon::prelude::*;
    use std::hash::Hash;

    /// Parallel iterator over cloned elements of a [`PersistentHashSet`].
    pub struct PersistentHashSetParallelIterator<T> {
        elements: Vec<T>,
    }

    impl<T: Send> ParallelIterator for PersistentHashSetParallelIterator<T> {
        type Item = T;

        fn drive_unindexed<C>(self, consumer: C) -> C::Result
        where
            C: UnindexedConsumer<Self::Item>,
        {
            self.elements.into_par_iter().drive_unindexed(consumer)
        }
    }

    impl<T: Clone + Hash + Eq + Send + Sync> PersistentHashSet<T> {
        /// Returns a parallel iterator over cloned elements.
        #[must_use]
        pub fn par_iter(&self) -> PersistentHashSetParallelIterator<T> {
            PersistentHashSetParallelIterator {
                elements: self.iter().cloned().collect(),
            }
        }
    }
}

#[cfg(feature = "rayon")]
pub use rayon_impl::PersistentHashSetParallelIterator;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_new_creates_empty() {
        let set: PersistentHashSet<i32> = PersistentHashSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(&1));
    }

    #[rstest]
    fn test_insert_and_contains() {
        let set = PersistentHashSet::new().insert(1).insert(2).insert(3);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&1));
        assert!(set.contains(&2));
        assert!(set.contains(&3));
        assert!(!set.contains(&4));
    }

    #[rstest]
    fn test_insert_is_idempotent() {
        let set = PersistentHashSet::new().insert(1).insert(1).insert(1);
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    fn test_remove() {
        let set: PersistentHashSet<i32> = (0..10).collect();
        let removed = set.remove(&5);
        assert_eq!(removed.len(), 9);
        assert!(!removed.contains(&5));
        assert!(set.contains(&5)); // Original unchanged
    }

    #[rstest]
    fn test_get_returns_stored_element() {
        let set = PersistentHashSet::new().insert("stored".to_string());
        assert_eq!(set.get("stored"), Some(&"stored".to_string()));
        assert_eq!(set.get("missing"), None);
    }

    #[rstest]
    fn test_union_intersection_difference() {
        let set_a: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
        let set_b: PersistentHashSet<i32> = [2, 3, 4].into_iter().collect();

        assert_eq!(set_a.union(&set_b).len(), 4);
        assert_eq!(set_a.intersection(&set_b).len(), 2);
        assert_eq!(set_a.difference(&set_b).len(), 1);
        assert!(set_a.difference(&set_b).contains(&1));
    }

    #[rstest]
    fn test_equality_is_order_independent() {
        let forward: PersistentHashSet<i32> = (0..100).collect();
        let backward: PersistentHashSet<i32> = (0..100).rev().collect();
        assert_eq!(forward, backward);
    }

    #[rstest]
    fn test_equal_sets_hash_equal() {
        fn hash_of<T: Hash>(value: &T) -> u64 {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let forward: PersistentHashSet<i32> = (0..100).collect();
        let backward: PersistentHashSet<i32> = (0..100).rev().collect();
        assert_eq!(hash_of(&forward), hash_of(&backward));
    }

    #[rstest]
    fn test_transient_dedup() {
        let mut transient = TransientHashSet::new();
        for element in 0..100 {
            transient.insert(element % 10);
        }
        assert_eq!(transient.len(), 10);
        assert!(transient.remove(&3));
        assert!(!transient.remove(&3));
        let set = transient.persistent();
        assert_eq!(set.len(), 9);
    }

    #[rstest]
    fn test_transient_does_not_modify_origin() {
        let origin: PersistentHashSet<i32> = (0..50).collect();
        let mut transient = TransientHashSet::from_persistent(origin.clone());
        for element in 0..50 {
            transient.remove(&element);
        }
        assert!(transient.is_empty());
        assert_eq!(origin.len(), 50);
    }
}
