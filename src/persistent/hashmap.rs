//! Persistent (immutable) hash map based on a hash array mapped trie.
//!
//! This module provides [`PersistentHashMap`], an immutable hash map
//! that uses structural sharing for efficient operations, and
//! [`TransientHashMap`], its single-owner mutable builder.
//!
//! # Overview
//!
//! `PersistentHashMap` is a 32-way hash array mapped trie navigated by
//! 5-bit slices of a 32-bit key hash. It provides:
//!
//! - O(log32 N) get (effectively O(1) for practical sizes)
//! - O(log32 N) insert
//! - O(log32 N) remove
//! - O(1) len and `is_empty`
//!
//! All operations return new maps without modifying the original,
//! and structural sharing ensures memory efficiency.
//!
//! # Internal Structure
//!
//! Three node kinds make up the trie:
//!
//! - **Bitmap nodes** carry two disjoint bitmaps over one compressed child
//!   array: a `datamap` bit marks a slot holding a key-value entry, a
//!   `nodemap` bit marks a slot holding a child node.
//! - **Full nodes** have all 32 slots populated and index children
//!   directly, skipping the bitmap arithmetic.
//! - **Collision nodes** hold the entries whose keys share a full 32-bit
//!   hash and are scanned linearly.
//!
//! Removal keeps the trie canonical: a sub-node left holding a single
//! entry is inlined into its parent, and a sub-node reduced to a bare
//! collision bucket is hoisted.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//!
//! assert_eq!(map.get("one"), Some(&1));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{OwnerToken, PERSISTENT, ReferenceCounter, next_owner_token};

// =============================================================================
// Constants
// =============================================================================

/// Bits per level in the trie
const BITS_PER_LEVEL: u32 = 5;

/// Bit mask for extracting a slot index from a hash
const MASK: u32 = 0x1F;

// =============================================================================
// Hash computation
// =============================================================================

#[cfg(feature = "ahash")]
type SelectedHasher = ahash::AHasher;

#[cfg(all(feature = "fxhash", not(feature = "ahash")))]
type SelectedHasher = rustc_hash::FxHasher;

#[cfg(not(any(feature = "ahash", feature = "fxhash")))]
type SelectedHasher = std::collections::hash_map::DefaultHasher;

/// Computes the 32-bit trie hash of a key.
///
/// The hasher is unseeded, so hashes are stable for the life of the
/// process and across processes for the default backend.
pub(crate) fn compute_hash<K: Hash + ?Sized>(key: &K) -> u32 {
    let mut hasher = SelectedHasher::default();
    key.hash(&mut hasher);
    hasher.finish() as u32
}

/// Extracts the 5-bit slot index for the given shift from a hash.
#[inline]
const fn hash_slot(hash: u32, shift: u32) -> u32 {
    (hash >> shift) & MASK
}

/// Returns the bitmap bit for a slot.
#[inline]
const fn bit_for(slot: u32) -> u32 {
    1 << slot
}

/// Returns the compressed-array position of `bit` within the union bitmap.
#[inline]
const fn position(union_map: u32, bit: u32) -> usize {
    (union_map & (bit - 1)).count_ones() as usize
}

// =============================================================================
// Node Definition
// =============================================================================

/// A child slot in a bitmap or full node.
#[derive(Clone)]
enum Child<K, V> {
    /// A key-value entry stored inline
    Entry { key: K, value: V },
    /// A sub-node
    Node(ReferenceCounter<Node<K, V>>),
}

/// Internal node structure for the trie.
///
/// Every node carries an owner token: `PERSISTENT` for nodes reachable from
/// persistent maps, or the token of the transient that created it.
#[derive(Clone)]
enum Node<K, V> {
    /// Bitmap-indexed branch: `datamap` marks entry slots, `nodemap` marks
    /// node slots; the two are disjoint and index one compressed array.
    Bitmap {
        owner: OwnerToken,
        datamap: u32,
        nodemap: u32,
        children: Vec<Child<K, V>>,
    },
    /// Branch with all 32 slots populated; children are indexed directly.
    Full {
        owner: OwnerToken,
        children: Vec<Child<K, V>>,
    },
    /// Entries whose keys share a full 32-bit hash.
    Collision {
        owner: OwnerToken,
        hash: u32,
        entries: Vec<(K, V)>,
    },
}

impl<K, V> Node<K, V> {
    /// Creates an empty bitmap node.
    const fn empty(owner: OwnerToken) -> Self {
        Node::Bitmap {
            owner,
            datamap: 0,
            nodemap: 0,
            children: Vec::new(),
        }
    }

    /// Returns the node's owner token.
    const fn owner(&self) -> OwnerToken {
        match self {
            Node::Bitmap { owner, .. }
            | Node::Full { owner, .. }
            | Node::Collision { owner, .. } => *owner,
        }
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Clones the node, stamping the clone with a new owner.
    fn clone_with_owner(&self, new_owner: OwnerToken) -> Self {
        let mut cloned = self.clone();
        match &mut cloned {
            Node::Bitmap { owner, .. }
            | Node::Full { owner, .. }
            | Node::Collision { owner, .. } => *owner = new_owner,
        }
        cloned
    }

    /// Returns the single remaining entry when the node has collapsed to
    /// one, for inlining into the parent.
    fn single_entry(&self) -> Option<(&K, &V)> {
        match self {
            Node::Bitmap {
                datamap,
                nodemap,
                children,
                ..
            } if *nodemap == 0 && datamap.count_ones() == 1 => match children.first() {
                Some(Child::Entry { key, value }) => Some((key, value)),
                _ => None,
            },
            Node::Collision { entries, .. } if entries.len() == 1 => {
                entries.first().map(|(key, value)| (key, value))
            }
            _ => None,
        }
    }

    /// Returns the bare collision bucket when the node is a bitmap wrapping
    /// nothing else, for hoisting into the parent.
    fn lone_collision_child(&self) -> Option<ReferenceCounter<Self>> {
        match self {
            Node::Bitmap {
                datamap,
                nodemap,
                children,
                ..
            } if *datamap == 0 && nodemap.count_ones() == 1 => match children.first() {
                Some(Child::Node(child)) if matches!(child.as_ref(), Node::Collision { .. }) => {
                    Some(child.clone())
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Wraps a bitmap in a full node when every slot is populated. The
/// compressed array is slot-ordered, so it is already the direct-indexed
/// layout.
fn seal_bitmap<K, V>(
    owner: OwnerToken,
    datamap: u32,
    nodemap: u32,
    children: Vec<Child<K, V>>,
) -> Node<K, V> {
    if datamap | nodemap == u32::MAX {
        Node::Full { owner, children }
    } else {
        Node::Bitmap {
            owner,
            datamap,
            nodemap,
            children,
        }
    }
}

/// Builds the node merging two entries that landed on the same slot,
/// descending until their hashes diverge or collide entirely.
fn merge_entries<K, V>(
    owner: OwnerToken,
    shift: u32,
    first_key: K,
    first_value: V,
    first_hash: u32,
    second_key: K,
    second_value: V,
    second_hash: u32,
) -> Node<K, V> {
    if first_hash == second_hash {
        return Node::Collision {
            owner,
            hash: first_hash,
            entries: vec![(first_key, first_value), (second_key, second_value)],
        };
    }

    let first_slot = hash_slot(first_hash, shift);
    let second_slot = hash_slot(second_hash, shift);

    if first_slot == second_slot {
        let child = merge_entries(
            owner,
            shift + BITS_PER_LEVEL,
            first_key,
            first_value,
            first_hash,
            second_key,
            second_value,
            second_hash,
        );
        Node::Bitmap {
            owner,
            datamap: 0,
            nodemap: bit_for(first_slot),
            children: vec![Child::Node(ReferenceCounter::new(child))],
        }
    } else {
        let (low, high) = if first_slot < second_slot {
            (
                Child::Entry {
                    key: first_key,
                    value: first_value,
                },
                Child::Entry {
                    key: second_key,
                    value: second_value,
                },
            )
        } else {
            (
                Child::Entry {
                    key: second_key,
                    value: second_value,
                },
                Child::Entry {
                    key: first_key,
                    value: first_value,
                },
            )
        };
        Node::Bitmap {
            owner,
            datamap: bit_for(first_slot) | bit_for(second_slot),
            nodemap: 0,
            children: vec![low, high],
        }
    }
}

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on a hash array mapped trie.
///
/// `PersistentHashMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `insert`       | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `contains_key` | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `is_empty`     | O(1)              |
///
/// # Examples
///
/// ```rust
/// use spork_pds::persistent::PersistentHashMap;
///
/// let map = PersistentHashMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
#[derive(Clone)]
pub struct PersistentHashMap<K, V> {
    /// Root node of the trie
    root: ReferenceCounter<Node<K, V>>,
    /// Number of entries
    length: usize,
}

impl<K, V> PersistentHashMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spork_pds::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::empty(PERSISTENT)),
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash`
    /// and `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spork_pds::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and value for the given key.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        get_from_node(&self.root, key, hash, 0)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains the key, the value is replaced.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spork_pds::persistent::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new().insert("key".to_string(), 1);
    /// let map2 = map1.insert("key".to_string(), 2);
    ///
    /// assert_eq!(map1.get("key"), Some(&1)); // Original unchanged
    /// assert_eq!(map2.get("key"), Some(&2)); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash = compute_hash(&key);
        let (new_root, added) = insert_into_node(&self.root, key, value, hash, 0);

        Self {
            root: ReferenceCounter::new(new_root),
            length: if added { self.length + 1 } else { self.length },
        }
    }

    /// Removes a key from the map.
    ///
    /// Returns the same map when the key is absent.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spork_pds::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let removed = map.remove("a");
    ///
    /// assert_eq!(removed.get("a"), None);
    /// assert_eq!(map.get("a"), Some(&1)); // Original unchanged
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        match remove_from_node(&self.root, key, hash, 0) {
            Removal::NotFound => self.clone(),
            Removal::Replaced(node) => Self {
                root: ReferenceCounter::new(node),
                length: self.length - 1,
            },
            Removal::InlinedEntry(entry_key, entry_value) => {
                // The trie collapsed to one entry; rebuild a canonical root
                let hash = compute_hash(&entry_key);
                Self {
                    root: ReferenceCounter::new(Node::Bitmap {
                        owner: PERSISTENT,
                        datamap: bit_for(hash_slot(hash, 0)),
                        nodemap: 0,
                        children: vec![Child::Entry {
                            key: entry_key,
                            value: entry_value,
                        }],
                    }),
                    length: self.length - 1,
                }
            }
            Removal::Emptied => Self::new(),
        }
    }

    /// Merges another map into this one; entries of `other` win on
    /// conflicting keys.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut transient = TransientHashMap::from_persistent(self.clone());
        for (key, value) in other.iter() {
            transient.insert(key.clone(), value.clone());
        }
        transient.persistent()
    }

    /// Returns an iterator over key-value pairs.
    ///
    /// The order is deterministic for a given map but unspecified across
    /// versions.
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        let mut entries = Vec::with_capacity(self.length);
        collect_entries(&self.root, &mut entries);
        PersistentHashMapIterator {
            entries,
            current_index: 0,
        }
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

/// Recursive helper for lookups.
fn get_from_node<'a, K, V, Q>(
    node: &'a Node<K, V>,
    key: &Q,
    hash: u32,
    shift: u32,
) -> Option<(&'a K, &'a V)>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    match node {
        Node::Bitmap {
            datamap,
            nodemap,
            children,
            ..
        } => {
            let bit = bit_for(hash_slot(hash, shift));
            if datamap & bit != 0 {
                let index = position(datamap | nodemap, bit);
                match children.get(index) {
                    Some(Child::Entry { key: entry_key, value }) if entry_key.borrow() == key => {
                        Some((entry_key, value))
                    }
                    _ => None,
                }
            } else if nodemap & bit != 0 {
                let index = position(datamap | nodemap, bit);
                match children.get(index) {
                    Some(Child::Node(child)) => {
                        get_from_node(child, key, hash, shift + BITS_PER_LEVEL)
                    }
                    _ => None,
                }
            } else {
                None
            }
        }
        Node::Full { children, .. } => {
            let slot = hash_slot(hash, shift) as usize;
            match children.get(slot) {
                Some(Child::Entry { key: entry_key, value }) if entry_key.borrow() == key => {
                    Some((entry_key, value))
                }
                Some(Child::Node(child)) => {
                    get_from_node(child, key, hash, shift + BITS_PER_LEVEL)
                }
                _ => None,
            }
        }
        Node::Collision {
            hash: collision_hash,
            entries,
            ..
        } => {
            if *collision_hash != hash {
                return None;
            }
            entries
                .iter()
                .find(|(entry_key, _)| entry_key.borrow() == key)
                .map(|(entry_key, value)| (entry_key, value))
        }
    }
}

/// Recursive helper for insert.
/// Returns (`new_node`, `was_added`) where `was_added` is true if a new
/// entry was added rather than replaced.
fn insert_into_node<K: Clone + Hash + Eq, V: Clone>(
    node: &Node<K, V>,
    key: K,
    value: V,
    hash: u32,
    shift: u32,
) -> (Node<K, V>, bool) {
    match node {
        Node::Bitmap {
            datamap,
            nodemap,
            children,
            ..
        } => insert_into_bitmap_node(*datamap, *nodemap, children, key, value, hash, shift),
        Node::Full { children, .. } => {
            insert_into_full_node(children, key, value, hash, shift)
        }
        Node::Collision {
            hash: collision_hash,
            entries,
            ..
        } => insert_into_collision_node(*collision_hash, entries, key, value, hash, shift),
    }
}

/// Helper for inserting into a bitmap node.
fn insert_into_bitmap_node<K: Clone + Hash + Eq, V: Clone>(
    datamap: u32,
    nodemap: u32,
    children: &[Child<K, V>],
    key: K,
    value: V,
    hash: u32,
    shift: u32,
) -> (Node<K, V>, bool) {
    let bit = bit_for(hash_slot(hash, shift));
    let index = position(datamap | nodemap, bit);

    if datamap & bit != 0 {
        // Slot holds an entry
        let Some(Child::Entry {
            key: existing_key,
            value: existing_value,
        }) = children.get(index)
        else {
            return (seal_bitmap(PERSISTENT, datamap, nodemap, children.to_vec()), false);
        };

        if *existing_key == key {
            // Replace the value in place
            let mut new_children = children.to_vec();
            new_children[index] = Child::Entry { key, value };
            (
                seal_bitmap(PERSISTENT, datamap, nodemap, new_children),
                false,
            )
        } else {
            // Split the slot into a sub-node holding both entries; the
            // union bitmap is unchanged so the position stays put
            let existing_hash = compute_hash(existing_key);
            let merged = merge_entries(
                PERSISTENT,
                shift + BITS_PER_LEVEL,
                existing_key.clone(),
                existing_value.clone(),
                existing_hash,
                key,
                value,
                hash,
            );
            let mut new_children = children.to_vec();
            new_children[index] = Child::Node(ReferenceCounter::new(merged));
            (
                seal_bitmap(PERSISTENT, datamap & !bit, nodemap | bit, new_children),
                true,
            )
        }
    } else if nodemap & bit != 0 {
        // Slot holds a sub-node; recurse
        let Some(Child::Node(child)) = children.get(index) else {
            return (seal_bitmap(PERSISTENT, datamap, nodemap, children.to_vec()), false);
        };
        let (new_child, added) = insert_into_node(child, key, value, hash, shift + BITS_PER_LEVEL);
        let mut new_children = children.to_vec();
        new_children[index] = Child::Node(ReferenceCounter::new(new_child));
        (
            seal_bitmap(PERSISTENT, datamap, nodemap, new_children),
            added,
        )
    } else {
        // Free slot: insert the entry
        let mut new_children = children.to_vec();
        new_children.insert(index, Child::Entry { key, value });
        (
            seal_bitmap(PERSISTENT, datamap | bit, nodemap, new_children),
            true,
        )
    }
}

/// Helper for inserting into a full node.
fn insert_into_full_node<K: Clone + Hash + Eq, V: Clone>(
    children: &[Child<K, V>],
    key: K,
    value: V,
    hash: u32,
    shift: u32,
) -> (Node<K, V>, bool) {
    let slot = hash_slot(hash, shift) as usize;

    match children.get(slot) {
        Some(Child::Entry {
            key: existing_key,
            value: existing_value,
        }) => {
            let mut new_children = children.to_vec();
            if *existing_key == key {
                new_children[slot] = Child::Entry { key, value };
                (
                    Node::Full {
                        owner: PERSISTENT,
                        children: new_children,
                    },
                    false,
                )
            } else {
                let existing_hash = compute_hash(existing_key);
                let merged = merge_entries(
                    PERSISTENT,
                    shift + BITS_PER_LEVEL,
                    existing_key.clone(),
                    existing_value.clone(),
                    existing_hash,
                    key,
                    value,
                    hash,
                );
                new_children[slot] = Child::Node(ReferenceCounter::new(merged));
                (
                    Node::Full {
                        owner: PERSISTENT,
                        children: new_children,
                    },
                    true,
                )
            }
        }
        Some(Child::Node(child)) => {
            let (new_child, added) = insert_into_node(child, key, value, hash, shift + BITS_PER_LEVEL);
            let mut new_children = children.to_vec();
            new_children[slot] = Child::Node(ReferenceCounter::new(new_child));
            (
                Node::Full {
                    owner: PERSISTENT,
                    children: new_children,
                },
                added,
            )
        }
        None => (
            Node::Full {
                owner: PERSISTENT,
                children: children.to_vec(),
            },
            false,
        ),
    }
}

/// Helper for inserting into a collision node.
fn insert_into_collision_node<K: Clone + Hash + Eq, V: Clone>(
    collision_hash: u32,
    entries: &[(K, V)],
    key: K,
    value: V,
    hash: u32,
    shift: u32,
) -> (Node<K, V>, bool) {
    if collision_hash == hash {
        let mut new_entries = entries.to_vec();
        if let Some(slot) = new_entries
            .iter_mut()
            .find(|(entry_key, _)| *entry_key == key)
        {
            slot.1 = value;
            (
                Node::Collision {
                    owner: PERSISTENT,
                    hash,
                    entries: new_entries,
                },
                false,
            )
        } else {
            new_entries.push((key, value));
            (
                Node::Collision {
                    owner: PERSISTENT,
                    hash,
                    entries: new_entries,
                },
                true,
            )
        }
    } else {
        // Push the bucket one level down and insert alongside it
        let wrapper = Node::Bitmap {
            owner: PERSISTENT,
            datamap: 0,
            nodemap: bit_for(hash_slot(collision_hash, shift)),
            children: vec![Child::Node(ReferenceCounter::new(Node::Collision {
                owner: PERSISTENT,
                hash: collision_hash,
                entries: entries.to_vec(),
            }))],
        };
        insert_into_node(&wrapper, key, value, hash, shift)
    }
}

/// Outcome of removing a key below some node.
enum Removal<K, V> {
    /// Key was absent; nothing changed
    NotFound,
    /// The node was rewritten
    Replaced(Node<K, V>),
    /// The node collapsed to a single entry to be inlined by the parent
    InlinedEntry(K, V),
    /// The node lost its last child
    Emptied,
}

/// Canonicalizes a freshly rewritten node into a removal outcome.
fn canonicalize<K: Clone, V: Clone>(node: Node<K, V>) -> Removal<K, V> {
    if let Some((key, value)) = node.single_entry() {
        return Removal::InlinedEntry(key.clone(), value.clone());
    }
    if let Some(collision) = node.lone_collision_child() {
        return Removal::Replaced(collision.as_ref().clone());
    }
    match &node {
        Node::Bitmap {
            datamap, nodemap, ..
        } if *datamap == 0 && *nodemap == 0 => Removal::Emptied,
        _ => Removal::Replaced(node),
    }
}

/// Recursive helper for remove.
fn remove_from_node<K, V, Q>(node: &Node<K, V>, key: &Q, hash: u32, shift: u32) -> Removal<K, V>
where
    K: Clone + Hash + Eq + Borrow<Q>,
    V: Clone,
    Q: Hash + Eq + ?Sized,
{
    match node {
        Node::Bitmap {
            datamap,
            nodemap,
            children,
            ..
        } => {
            let bit = bit_for(hash_slot(hash, shift));
            let index = position(datamap | nodemap, bit);

            if datamap & bit != 0 {
                match children.get(index) {
                    Some(Child::Entry { key: entry_key, .. }) if entry_key.borrow() == key => {
                        let mut new_children = children.to_vec();
                        new_children.remove(index);
                        canonicalize(Node::Bitmap {
                            owner: PERSISTENT,
                            datamap: datamap & !bit,
                            nodemap: *nodemap,
                            children: new_children,
                        })
                    }
                    _ => Removal::NotFound,
                }
            } else if nodemap & bit != 0 {
                let Some(Child::Node(child)) = children.get(index) else {
                    return Removal::NotFound;
                };
                match remove_from_node(child.as_ref(), key, hash, shift + BITS_PER_LEVEL) {
                    Removal::NotFound => Removal::NotFound,
                    Removal::Replaced(new_child) => {
                        let mut new_children = children.to_vec();
                        new_children[index] = Child::Node(ReferenceCounter::new(new_child));
                        Removal::Replaced(Node::Bitmap {
                            owner: PERSISTENT,
                            datamap: *datamap,
                            nodemap: *nodemap,
                            children: new_children,
                        })
                    }
                    Removal::InlinedEntry(entry_key, entry_value) => {
                        // Inline the child's last entry here; the union
                        // bitmap is unchanged so the position stays put
                        let mut new_children = children.to_vec();
                        new_children[index] = Child::Entry {
                            key: entry_key,
                            value: entry_value,
                        };
                        canonicalize(Node::Bitmap {
                            owner: PERSISTENT,
                            datamap: datamap | bit,
                            nodemap: nodemap & !bit,
                            children: new_children,
                        })
                    }
                    Removal::Emptied => {
                        let mut new_children = children.to_vec();
                        new_children.remove(index);
                        canonicalize(Node::Bitmap {
                            owner: PERSISTENT,
                            datamap: *datamap,
                            nodemap: nodemap & !bit,
                            children: new_children,
                        })
                    }
                }
            } else {
                Removal::NotFound
            }
        }
        Node::Full { children, .. } => {
            let slot = hash_slot(hash, shift) as usize;
            match children.get(slot) {
                Some(Child::Entry { key: entry_key, .. }) if entry_key.borrow() == key => {
                    // Demote to a bitmap node without this slot
                    let mut datamap = 0;
                    let mut nodemap = 0;
                    let mut new_children = Vec::with_capacity(children.len() - 1);
                    for (child_slot, child) in children.iter().enumerate() {
                        if child_slot == slot {
                            continue;
                        }
                        let child_bit = bit_for(child_slot as u32);
                        match child {
                            Child::Entry { .. } => datamap |= child_bit,
                            Child::Node(_) => nodemap |= child_bit,
                        }
                        new_children.push(child.clone());
                    }
                    canonicalize(Node::Bitmap {
                        owner: PERSISTENT,
                        datamap,
                        nodemap,
                        children: new_children,
                    })
                }
                Some(Child::Node(child)) => {
                    match remove_from_node(child.as_ref(), key, hash, shift + BITS_PER_LEVEL) {
                        Removal::NotFound => Removal::NotFound,
                        Removal::Replaced(new_child) => {
                            let mut new_children = children.to_vec();
                            new_children[slot] = Child::Node(ReferenceCounter::new(new_child));
                            Removal::Replaced(Node::Full {
                                owner: PERSISTENT,
                                children: new_children,
                            })
                        }
                        Removal::InlinedEntry(entry_key, entry_value) => {
                            let mut new_children = children.to_vec();
                            new_children[slot] = Child::Entry {
                                key: entry_key,
                                value: entry_value,
                            };
                            Removal::Replaced(Node::Full {
                                owner: PERSISTENT,
                                children: new_children,
                            })
                        }
                        Removal::Emptied => {
                            // A sub-node never empties without inlining
                            // first, but demote defensively if it does
                            let mut datamap = 0;
                            let mut nodemap = 0;
                            let mut new_children = Vec::with_capacity(children.len() - 1);
                            for (child_slot, child) in children.iter().enumerate() {
                                if child_slot == slot {
                                    continue;
                                }
                                let child_bit = bit_for(child_slot as u32);
                                match child {
                                    Child::Entry { .. } => datamap |= child_bit,
                                    Child::Node(_) => nodemap |= child_bit,
                                }
                                new_children.push(child.clone());
                            }
                            canonicalize(Node::Bitmap {
                                owner: PERSISTENT,
                                datamap,
                                nodemap,
                                children: new_children,
                            })
                        }
                    }
                }
                _ => Removal::NotFound,
            }
        }
        Node::Collision {
            hash: collision_hash,
            entries,
            ..
        } => {
            if *collision_hash != hash {
                return Removal::NotFound;
            }
            let Some(index) = entries
                .iter()
                .position(|(entry_key, _)| entry_key.borrow() == key)
            else {
                return Removal::NotFound;
            };
            let mut new_entries = entries.to_vec();
            new_entries.remove(index);
            canonicalize(Node::Collision {
                owner: PERSISTENT,
                hash,
                entries: new_entries,
            })
        }
    }
}

/// Collects all entries from a node into a vector, trie order.
fn collect_entries<'a, K, V>(node: &'a Node<K, V>, entries: &mut Vec<(&'a K, &'a V)>) {
    match node {
        Node::Bitmap { children, .. } | Node::Full { children, .. } => {
            for child in children {
                match child {
                    Child::Entry { key, value } => entries.push((key, value)),
                    Child::Node(subnode) => collect_entries(subnode, entries),
                }
            }
        }
        Node::Collision {
            entries: collision_entries,
            ..
        } => {
            for (key, value) in collision_entries {
                entries.push((key, value));
            }
        }
    }
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// An iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIterator<'a, K, V> {
    entries: Vec<(&'a K, &'a V)>,
    current_index: usize,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.current_index).copied()?;
        self.current_index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIterator<'_, K, V> {}

/// An owning iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = TransientHashMap::new();
        for (key, value) in iter {
            transient.insert(key, value);
        }
        transient.persistent()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> IntoIterator for PersistentHashMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentHashMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentHashMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K: Clone + Hash + Eq, V: Clone> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }

        for (key, value) in self {
            match other.get(key) {
                Some(other_value) if other_value == value => {}
                _ => return false,
            }
        }

        true
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Eq> Eq for PersistentHashMap<K, V> {}

impl<K: Clone + Hash + Eq, V: Clone + Hash> Hash for PersistentHashMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: equal maps hash equal whatever their history
        let mut sum: u32 = 0;
        for (key, value) in self.iter() {
            let mut entry_hasher = SelectedHasher::default();
            key.hash(&mut entry_hasher);
            value.hash(&mut entry_hasher);
            sum = sum.wrapping_add(entry_hasher.finish() as u32);
        }
        state.write_usize(self.length);
        state.write_u32(sum);
    }
}

impl<K: Clone + Hash + Eq + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug
    for PersistentHashMap<K, V>
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// TransientHashMap Definition
// =============================================================================

/// A transient (mutable) version of [`PersistentHashMap`] for batch
/// construction.
///
/// A transient is created from a persistent map in O(1) and mutates
/// owner-stamped nodes in place, cloning shared nodes exactly once. Calling
/// [`persistent()`](TransientHashMap::persistent) consumes the builder and
/// retires its owner token.
///
/// # Thread Safety
///
/// `TransientHashMap` is intentionally not `Send` or `Sync`: it is a
/// single-owner builder.
///
/// # Examples
///
/// ```rust
/// use spork_pds::persistent::TransientHashMap;
///
/// let mut transient = TransientHashMap::new();
/// transient.insert("one".to_string(), 1);
/// transient.insert("two".to_string(), 2);
/// let map = transient.persistent();
/// assert_eq!(map.len(), 2);
/// ```
pub struct TransientHashMap<K, V> {
    root: ReferenceCounter<Node<K, V>>,
    length: usize,
    owner: OwnerToken,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

// Static assertions to verify TransientHashMap is not Send/Sync
static_assertions::assert_not_impl_any!(TransientHashMap<i32, i32>: Send, Sync);
static_assertions::assert_not_impl_any!(TransientHashMap<String, String>: Send, Sync);

impl<K, V> TransientHashMap<K, V> {
    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the builder contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<K: Clone + Hash + Eq, V: Clone> TransientHashMap<K, V> {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::from_persistent(PersistentHashMap::new())
    }

    /// Creates a builder from a persistent map.
    ///
    /// # Complexity
    ///
    /// O(1) - shares the root
    #[must_use]
    pub fn from_persistent(map: PersistentHashMap<K, V>) -> Self {
        Self {
            root: map.root,
            length: map.length,
            owner: next_owner_token(),
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        get_from_node(&self.root, key, hash, 0).map(|(_, value)| value)
    }

    /// Returns `true` if the builder contains the given key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair, returning the previous value if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = compute_hash(&key);
        let owner = self.owner;
        let previous = insert_mut(&mut self.root, key, value, hash, 0, owner);
        if previous.is_none() {
            self.length += 1;
        }
        previous
    }

    /// Removes a key, returning the previous value if any.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        let owner = self.owner;
        let previous = remove_mut(&mut self.root, key, hash, 0, owner);
        if previous.is_some() {
            self.length -= 1;
        }
        previous
    }

    /// Converts the builder into a persistent map, consuming it.
    ///
    /// # Complexity
    ///
    /// O(1) - the owner token is retired, freezing every stamped node
    #[must_use]
    pub fn persistent(self) -> PersistentHashMap<K, V> {
        PersistentHashMap {
            root: self.root,
            length: self.length,
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Default for TransientHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for TransientHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TransientHashMap")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Transient node editing
// =============================================================================

/// Makes `node` editable by the given owner: nodes already stamped with the
/// owner are borrowed in place, all others are cloned once and stamped.
fn editable<K: Clone, V: Clone>(
    node: &mut ReferenceCounter<Node<K, V>>,
    owner: OwnerToken,
) -> &mut Node<K, V> {
    if node.owner() != owner {
        *node = ReferenceCounter::new(node.clone_with_owner(owner));
    }
    ReferenceCounter::make_mut(node)
}

/// Transient insert. Returns the replaced value if the key was present.
fn insert_mut<K: Clone + Hash + Eq, V: Clone>(
    node: &mut ReferenceCounter<Node<K, V>>,
    key: K,
    value: V,
    hash: u32,
    shift: u32,
    owner: OwnerToken,
) -> Option<V> {
    let node_ref = editable(node, owner);
    match &mut *node_ref {
        Node::Bitmap {
            datamap,
            nodemap,
            children,
            ..
        } => {
            let bit = bit_for(hash_slot(hash, shift));
            let index = position(*datamap | *nodemap, bit);

            if *datamap & bit != 0 {
                let Some(Child::Entry {
                    key: existing_key,
                    value: existing_value,
                }) = children.get_mut(index)
                else {
                    return None;
                };
                if *existing_key == key {
                    return Some(std::mem::replace(existing_value, value));
                }
                let existing_hash = compute_hash(existing_key);
                let merged = merge_entries(
                    owner,
                    shift + BITS_PER_LEVEL,
                    existing_key.clone(),
                    existing_value.clone(),
                    existing_hash,
                    key,
                    value,
                    hash,
                );
                children[index] = Child::Node(ReferenceCounter::new(merged));
                *datamap &= !bit;
                *nodemap |= bit;
                None
            } else if *nodemap & bit != 0 {
                let Some(Child::Node(child)) = children.get_mut(index) else {
                    return None;
                };
                insert_mut(child, key, value, hash, shift + BITS_PER_LEVEL, owner)
            } else {
                children.insert(index, Child::Entry { key, value });
                *datamap |= bit;
                if *datamap | *nodemap == u32::MAX {
                    let sealed = Node::Full {
                        owner,
                        children: std::mem::take(children),
                    };
                    *node_ref = sealed;
                }
                None
            }
        }
        Node::Full { children, .. } => {
            let slot = hash_slot(hash, shift) as usize;
            match children.get_mut(slot) {
                Some(Child::Entry {
                    key: existing_key,
                    value: existing_value,
                }) => {
                    if *existing_key == key {
                        return Some(std::mem::replace(existing_value, value));
                    }
                    let existing_hash = compute_hash(existing_key);
                    let merged = merge_entries(
                        owner,
                        shift + BITS_PER_LEVEL,
                        existing_key.clone(),
                        existing_value.clone(),
                        existing_hash,
                        key,
                        value,
                        hash,
                    );
                    children[slot] = Child::Node(ReferenceCounter::new(merged));
                    None
                }
                Some(Child::Node(child)) => {
                    insert_mut(child, key, value, hash, shift + BITS_PER_LEVEL, owner)
                }
                None => None,
            }
        }
        Node::Collision {
            hash: collision_hash,
            entries,
            ..
        } => {
            if *collision_hash == hash {
                if let Some(slot) = entries.iter_mut().find(|(entry_key, _)| *entry_key == key) {
                    return Some(std::mem::replace(&mut slot.1, value));
                }
                entries.push((key, value));
                return None;
            }

            // Push the bucket one level down, then place the new entry
            let bucket_slot = hash_slot(*collision_hash, shift);
            let new_slot = hash_slot(hash, shift);
            let bucket = Node::Collision {
                owner,
                hash: *collision_hash,
                entries: std::mem::take(entries),
            };

            if bucket_slot == new_slot {
                let mut child = ReferenceCounter::new(bucket);
                let result = insert_mut(&mut child, key, value, hash, shift + BITS_PER_LEVEL, owner);
                *node_ref = Node::Bitmap {
                    owner,
                    datamap: 0,
                    nodemap: bit_for(bucket_slot),
                    children: vec![Child::Node(child)],
                };
                result
            } else {
                let bucket_child = Child::Node(ReferenceCounter::new(bucket));
                let entry_child = Child::Entry { key, value };
                let children = if new_slot < bucket_slot {
                    vec![entry_child, bucket_child]
                } else {
                    vec![bucket_child, entry_child]
                };
                *node_ref = Node::Bitmap {
                    owner,
                    datamap: bit_for(new_slot),
                    nodemap: bit_for(bucket_slot),
                    children,
                };
                None
            }
        }
    }
}

/// Owned replacement for a collapsed child, computed by probing.
enum ChildCollapse<K, V> {
    Inline(K, V),
    Hoist(ReferenceCounter<Node<K, V>>),
}

/// Probes a child for a post-removal collapse: a child reduced to a single
/// entry should be inlined into its parent, a child reduced to a bare
/// collision bucket should be hoisted.
fn probe_child_collapse<K: Clone, V: Clone>(
    children: &[Child<K, V>],
    index: usize,
) -> Option<ChildCollapse<K, V>> {
    match children.get(index) {
        Some(Child::Node(child)) => {
            if let Some((entry_key, entry_value)) = child.single_entry() {
                Some(ChildCollapse::Inline(entry_key.clone(), entry_value.clone()))
            } else {
                child.lone_collision_child().map(ChildCollapse::Hoist)
            }
        }
        _ => None,
    }
}

/// Collapses a freshly edited child of a bitmap node in place.
fn canonicalize_child_mut<K: Clone, V: Clone>(
    datamap: &mut u32,
    nodemap: &mut u32,
    children: &mut [Child<K, V>],
    index: usize,
    bit: u32,
) {
    match probe_child_collapse(children, index) {
        Some(ChildCollapse::Inline(key, value)) => {
            children[index] = Child::Entry { key, value };
            *datamap |= bit;
            *nodemap &= !bit;
        }
        Some(ChildCollapse::Hoist(collision)) => {
            children[index] = Child::Node(collision);
        }
        None => {}
    }
}

/// Collapses a freshly edited child of a full node in place. The slot stays
/// populated, so the node remains full.
fn canonicalize_full_child_mut<K: Clone, V: Clone>(children: &mut [Child<K, V>], slot: usize) {
    match probe_child_collapse(children, slot) {
        Some(ChildCollapse::Inline(key, value)) => {
            children[slot] = Child::Entry { key, value };
        }
        Some(ChildCollapse::Hoist(collision)) => {
            children[slot] = Child::Node(collision);
        }
        None => {}
    }
}

/// Transient remove. Returns the removed value if the key was present.
fn remove_mut<K, V, Q>(
    node: &mut ReferenceCounter<Node<K, V>>,
    key: &Q,
    hash: u32,
    shift: u32,
    owner: OwnerToken,
) -> Option<V>
where
    K: Clone + Hash + Eq + Borrow<Q>,
    V: Clone,
    Q: Hash + Eq + ?Sized,
{
    // Absent keys must not clone the path, so probe before editing
    if get_from_node(node.as_ref(), key, hash, shift).is_none() {
        return None;
    }

    let node_ref = editable(node, owner);
    match &mut *node_ref {
        Node::Bitmap {
            datamap,
            nodemap,
            children,
            ..
        } => {
            let bit = bit_for(hash_slot(hash, shift));
            let index = position(*datamap | *nodemap, bit);

            if *datamap & bit != 0 {
                match children.remove(index) {
                    Child::Entry { value, .. } => {
                        *datamap &= !bit;
                        Some(value)
                    }
                    child @ Child::Node(_) => {
                        children.insert(index, child);
                        None
                    }
                }
            } else if *nodemap & bit != 0 {
                let removed = {
                    let Some(Child::Node(child)) = children.get_mut(index) else {
                        return None;
                    };
                    remove_mut(child, key, hash, shift + BITS_PER_LEVEL, owner)
                };
                if removed.is_some() {
                    canonicalize_child_mut(datamap, nodemap, children, index, bit);
                }
                removed
            } else {
                None
            }
        }
        Node::Full { children, .. } => {
            let slot = hash_slot(hash, shift) as usize;
            let is_matching_entry = matches!(
                children.get(slot),
                Some(Child::Entry { key: entry_key, .. }) if entry_key.borrow() == key
            );

            if is_matching_entry {
                // Demote to a bitmap node without this slot
                let mut datamap = 0;
                let mut nodemap = 0;
                let mut removed_value = None;
                let mut new_children = Vec::with_capacity(31);
                for (child_slot, child) in std::mem::take(children).into_iter().enumerate() {
                    if child_slot == slot {
                        if let Child::Entry { value, .. } = child {
                            removed_value = Some(value);
                        }
                        continue;
                    }
                    let child_bit = bit_for(child_slot as u32);
                    match &child {
                        Child::Entry { .. } => datamap |= child_bit,
                        Child::Node(_) => nodemap |= child_bit,
                    }
                    new_children.push(child);
                }
                *node_ref = Node::Bitmap {
                    owner,
                    datamap,
                    nodemap,
                    children: new_children,
                };
                removed_value
            } else {
                let removed = {
                    let Some(Child::Node(child)) = children.get_mut(slot) else {
                        return None;
                    };
                    remove_mut(child, key, hash, shift + BITS_PER_LEVEL, owner)
                };
                if removed.is_some() {
                    canonicalize_full_child_mut(children, slot);
                }
                removed
            }
        }
        Node::Collision { entries, .. } => {
            let index = entries
                .iter()
                .position(|(entry_key, _)| entry_key.borrow() == key)?;
            let (_, value) = entries.remove(index);
            Some(value)
        }
    }
}

// =============================================================================
// Rayon Parallel Iterator
// =============================================================================

#[cfg(feature = "rayon")]
mod rayon_impl {
    use super::PersistentHashMap;
    use rayon::iter::plumbing::UnindexedConsumer;
    use rayon::prelude::*;
    use std::hash::Hash;

    /// Parallel iterator over cloned entries of a [`PersistentHashMap`].
    pub struct PersistentHashMapParallelIterator<K, V> {
        entries: Vec<(K, V)>,
    }

    impl<K: Send, V: Send> ParallelIterator for PersistentHashMapParallelIterator<K, V> {
        type Item = (K, V);

        fn drive_unindexed<C>(self, consumer: C) -> C::Result
        where
            C: UnindexedConsumer<Self::Item>,
        {
            self.entries.into_par_iter().drive_unindexed(consumer)
        }
    }

    impl<K: Clone + Hash + Eq + Send + Sync, V: Clone + Send + Sync> PersistentHashMap<K, V> {
        /// Returns a parallel iterator over cloned entries.
        #[must_use]
        pub fn par_iter(&self) -> PersistentHashMapParallelIterator<K, V> {
            PersistentHashMapParallelIterator {
                entries: self
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            }
        }
    }
}

#[cfg(feature = "rayon")]
pub use rayon_impl::PersistentHashMapParallelIterator;

// =============================================================================
// Tests
// =============================================================================
