//! # spork-pds
//!
//! Persistent data structures and the sequence runtime for the Spork
//! language.
//!
//! ## Overview
//!
//! This crate is the collection runtime that compiled Spork programs call
//! into. It provides:
//!
//! - **Persistent collections**: immutable vector (32-way radix trie with a
//!   tail buffer), hash map (HAMT with bitmap/full/collision nodes), hash
//!   set, and a sorted vector ordered by a key function.
//! - **Transients**: single-owner mutable builders that share structure
//!   with their persistent origin and convert back in O(1).
//! - **Dynamic values**: the [`value::Value`] universe with semantic
//!   equality and stable hashing across numbers, strings, keywords,
//!   symbols, and collections.
//! - **The sequence protocol**: `first`/`rest`/`seq` over every collection,
//!   cons cells, memoized lazy sequences, and the lazy/eager combinator
//!   library (`map`, `filter`, `take`, `reduce`, ...).
//!
//! All persistent operations return new versions and never mutate reachable
//! state, so any number of threads may read a persistent value
//! concurrently. Transients are single-owner and deliberately `!Send`.
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes with `Arc` instead of `Rc`
//! - `rayon`: parallel iterators over the persistent collections (implies `arc`)
//! - `fxhash` / `ahash`: alternative hashers for the hash map and set
//!
//! ## Example
//!
//! ```rust
//! use spork_pds::persistent::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! let updated = vector.update(50, 999).unwrap();
//!
//! assert_eq!(vector.get(50), Some(&50));   // Original unchanged
//! assert_eq!(updated.get(50), Some(&999)); // New version
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and functions.
///
/// # Usage
///
/// ```rust
/// use spork_pds::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{PdsError, Result};
    pub use crate::ops::*;
    pub use crate::persistent::*;
    pub use crate::seq::*;
    pub use crate::value::{
        Keyword, Symbol, Value, ValueFn, ValueFn2, compare, hash_value, value_fn, value_fn2,
    };
}

pub mod error;
pub mod ops;
pub mod persistent;
pub mod seq;
pub mod value;
