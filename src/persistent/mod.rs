//! Persistent (immutable) collections.
//!
//! This module provides the structurally shared collections at the heart of
//! the runtime:
//!
//! - [`PersistentVector`]: persistent vector (32-way radix trie + tail)
//! - [`PersistentHashMap`]: persistent hash map (HAMT)
//! - [`PersistentHashSet`]: persistent hash set (based on HAMT)
//! - [`SortedVector`]: vector kept ordered by a key function
//!
//! Each persistent collection has a transient counterpart
//! ([`TransientVector`], [`TransientHashMap`], [`TransientHashSet`],
//! [`TransientSortedVector`]) for single-owner batch construction.
//!
//! # Structural Sharing
//!
//! Operations on persistent values return new versions that share all
//! untouched subtrees with their origin. Holding an old version costs only
//! the path that later versions rewrote.
//!
//! ```rust
//! use spork_pds::persistent::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! let updated = vector.update(50, 999).unwrap();
//! assert_eq!(vector.get(50), Some(&50));     // Original unchanged
//! assert_eq!(updated.get(50), Some(&999));   // New version
//! ```
//!
//! # Transients and owner tokens
//!
//! A transient is created from a persistent value in O(1) and stamps every
//! node it rewrites with a process-unique owner token. A mutation walks to
//! its target; nodes already carrying the transient's token are edited in
//! place, all others are cloned once and stamped. Converting back with
//! `persistent()` is O(1): the token is retired and can never match again.
//!
//! ```rust
//! use spork_pds::persistent::{PersistentVector, TransientVector};
//!
//! let mut transient = TransientVector::from_persistent(PersistentVector::new());
//! for index in 0..1000 {
//!     transient.push_back(index);
//! }
//! let vector = transient.persistent();
//! assert_eq!(vector.len(), 1000);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

// =============================================================================
// Owner Tokens
// =============================================================================

/// Owner stamp carried by trie nodes. `PERSISTENT` (zero) marks nodes that
/// belong to persistent values; any other value identifies the transient
/// that created the node.
pub(crate) type OwnerToken = u64;

/// The owner stamp of persistent nodes: matches no live transient.
pub(crate) const PERSISTENT: OwnerToken = 0;

static NEXT_OWNER_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh, process-unique owner token for a new transient.
///
/// Tokens are never reused, so retiring one (by dropping the transient that
/// held it) permanently freezes every node stamped with it.
pub(crate) fn next_owner_token() -> OwnerToken {
    NEXT_OWNER_TOKEN.fetch_add(1, Ordering::Relaxed)
}

mod hashmap;
mod hashset;
mod sorted_vector;
mod vector;

pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIntoIterator;
pub use hashmap::PersistentHashMapIterator;
pub use hashmap::TransientHashMap;
pub use hashset::PersistentHashSet;
pub use hashset::PersistentHashSetIntoIterator;
pub use hashset::PersistentHashSetIterator;
pub use hashset::TransientHashSet;
pub use sorted_vector::SortedKey;
pub use sorted_vector::SortedVector;
pub use sorted_vector::TransientSortedVector;
pub use vector::Chunks;
pub use vector::PersistentVector;
pub use vector::PersistentVectorIntoIterator;
pub use vector::PersistentVectorIterator;
pub use vector::TransientVector;

// Rayon parallel iterator re-exports
#[cfg(feature = "rayon")]
pub use hashmap::PersistentHashMapParallelIterator;
#[cfg(feature = "rayon")]
pub use hashset::PersistentHashSetParallelIterator;
#[cfg(feature = "rayon")]
pub use vector::PersistentVectorParallelIterator;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod owner_token_tests {
    use super::{PERSISTENT, next_owner_token};
    use rstest::rstest;

    #[rstest]
    fn test_tokens_are_unique_and_nonzero() {
        let first = next_owner_token();
        let second = next_owner_token();
        assert_ne!(first, PERSISTENT);
        assert_ne!(second, PERSISTENT);
        assert_ne!(first, second);
    }
}
