//! The dynamic value universe of the runtime.
//!
//! Compiled programs manipulate [`Value`]s: tagged dynamic values with
//! semantic equality, a stable 32-bit hash, and a partial ordering. The
//! semantics intentionally differ from plain Rust equality:
//!
//! - Numbers compare by numeric value across integer/float kinds:
//!   `1 == 1.0`, and both hash identically so either works as a map key.
//! - Keywords and symbols compare by name; a keyword is never equal to the
//!   string spelling of its name.
//! - Every *sequential* value (vectors, specialized vectors, sorted
//!   vectors, cons cells, lazy seqs) compares equal to any other sequential
//!   with the same elements in the same order, and all of them share one
//!   hash formula.
//! - Maps and sets hash order-independently, so equal collections hash
//!   equal whatever their construction history.
//!
//! # Examples
//!
//! ```rust
//! use spork_pds::value::Value;
//!
//! assert_eq!(Value::Int(1), Value::Float(1.0));
//! assert_ne!(Value::keyword("foo"), Value::from(":foo"));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{PdsError, Result};
use crate::persistent::{
    PersistentHashMap, PersistentHashSet, PersistentVector, ReferenceCounter, SortedVector,
};
use crate::seq::{Cons, LazySeq, SeqIter, sequential_compare, sequential_equals};

// =============================================================================
// Callback aliases
// =============================================================================

/// A shared one-argument function over values, as passed to `map`,
/// `filter`, and friends.
#[cfg(feature = "arc")]
pub type ValueFn = std::sync::Arc<dyn Fn(&Value) -> Value>;

/// A shared one-argument function over values, as passed to `map`,
/// `filter`, and friends.
#[cfg(not(feature = "arc"))]
pub type ValueFn = std::rc::Rc<dyn Fn(&Value) -> Value>;

/// A shared two-argument function over values, as passed to `reduce`.
#[cfg(feature = "arc")]
pub type ValueFn2 = std::sync::Arc<dyn Fn(&Value, &Value) -> Value>;

/// A shared two-argument function over values, as passed to `reduce`.
#[cfg(not(feature = "arc"))]
pub type ValueFn2 = std::rc::Rc<dyn Fn(&Value, &Value) -> Value>;

/// Wraps a closure as a shared [`ValueFn`].
pub fn value_fn(function: impl Fn(&Value) -> Value + 'static) -> ValueFn {
    ReferenceCounter::new(function)
}

/// Wraps a closure as a shared [`ValueFn2`].
pub fn value_fn2(function: impl Fn(&Value, &Value) -> Value + 'static) -> ValueFn2 {
    ReferenceCounter::new(function)
}

// =============================================================================
// Keyword and Symbol
// =============================================================================

/// An interned-by-name keyword, like `:status`.
///
/// Keywords evaluate to themselves and are the idiomatic map key. Equality
/// and hashing go by name; the printed form carries a leading colon.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword {
    name: ReferenceCounter<str>,
}

impl Keyword {
    /// Creates a keyword from its name; a leading `:` is stripped.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let bare = name.strip_prefix(':').unwrap_or(name);
        Self {
            name: ReferenceCounter::from(bare),
        }
    }

    /// Returns the keyword's name without the leading colon.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, ":{}", self.name)
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{self}")
    }
}

/// A symbolic identifier, like `my-var`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    name: ReferenceCounter<str>,
}

impl Symbol {
    /// Creates a symbol from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: ReferenceCounter::from(name),
        }
    }

    /// Returns the symbol's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{self}")
    }
}

// =============================================================================
// Value Definition
// =============================================================================

/// A dynamic runtime value.
///
/// Collection variants hold the persistent structures from
/// [`crate::persistent`]; `Cons` and `LazySeq` carry the sequence kinds
/// from [`crate::seq`].
#[derive(Clone)]
pub enum Value {
    /// The absent value; also the canonical empty sequence.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// An immutable string.
    Str(ReferenceCounter<str>),
    /// A keyword such as `:name`.
    Keyword(Keyword),
    /// A symbol.
    Symbol(Symbol),
    /// A persistent vector of values.
    Vector(PersistentVector<Value>),
    /// A persistent vector specialized to packed `f64` storage.
    DoubleVector(PersistentVector<f64>),
    /// A persistent vector specialized to packed `i64` storage.
    IntVector(PersistentVector<i64>),
    /// A vector kept ordered by a key function.
    SortedVector(SortedVector),
    /// A persistent hash map.
    Map(PersistentHashMap<Value, Value>),
    /// A persistent hash set.
    Set(PersistentHashSet<Value>),
    /// An immutable cons cell.
    Cons(ReferenceCounter<Cons>),
    /// A memoized lazy sequence.
    LazySeq(ReferenceCounter<LazySeq>),
}

impl Value {
    /// Creates a keyword value.
    #[must_use]
    pub fn keyword(name: &str) -> Self {
        Value::Keyword(Keyword::new(name))
    }

    /// Creates a symbol value.
    #[must_use]
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    /// Creates a string value.
    #[must_use]
    pub fn string(text: &str) -> Self {
        Value::Str(ReferenceCounter::from(text))
    }

    /// Returns the kind of the value, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::Vector(_) => "vector",
            Value::DoubleVector(_) => "double-vector",
            Value::IntVector(_) => "int-vector",
            Value::SortedVector(_) => "sorted-vector",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Cons(_) => "cons",
            Value::LazySeq(_) => "lazy-seq",
        }
    }

    /// Returns `true` unless the value is `nil` or `false`.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Returns `true` when the value is `nil`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns `true` for the ordered element kinds: vectors (plain,
    /// specialized, sorted), cons cells, and lazy seqs.
    #[must_use]
    pub const fn is_sequential(&self) -> bool {
        matches!(
            self,
            Value::Vector(_)
                | Value::DoubleVector(_)
                | Value::IntVector(_)
                | Value::SortedVector(_)
                | Value::Cons(_)
                | Value::LazySeq(_)
        )
    }

    /// Returns the numeric value when the value is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value when the value is an integer, or a float
    /// with no fractional part.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Float(value) if float_is_integral(*value) => Some(*value as i64),
            _ => None,
        }
    }
}

/// Returns `true` when a float carries an exactly representable integer.
///
/// The upper bound is exclusive: 2^63 itself is representable as a float
/// but not as an `i64`, and treating it as integral would let distinct
/// numbers compare equal near the boundary.
fn float_is_integral(value: f64) -> bool {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    value.fract() == 0.0 && value >= -TWO_POW_63 && value < TWO_POW_63
}

// =============================================================================
// Conversions
// =============================================================================

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(&value)
    }
}

impl From<Keyword> for Value {
    fn from(value: Keyword) -> Self {
        Value::Keyword(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

// =============================================================================
// Equality
// =============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Int(left), Value::Int(right)) => left == right,
            (Value::Float(left), Value::Float(right)) => {
                left == right || (left.is_nan() && right.is_nan())
            }
            (Value::Int(left), Value::Float(right)) => int_float_equal(*left, *right),
            (Value::Float(left), Value::Int(right)) => int_float_equal(*right, *left),
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::Keyword(left), Value::Keyword(right)) => left == right,
            (Value::Symbol(left), Value::Symbol(right)) => left == right,
            (Value::Map(left), Value::Map(right)) => left == right,
            (Value::Set(left), Value::Set(right)) => left == right,
            (left, right) if left.is_sequential() && right.is_sequential() => {
                sequential_equals(left, right)
            }
            _ => false,
        }
    }
}

/// Exact integer/float equality: the float must carry the same integer, so
/// rounding near the `i64` boundary cannot conflate distinct numbers.
fn int_float_equal(int: i64, float: f64) -> bool {
    float_is_integral(float) && float as i64 == int
}

// NaN equals NaN here, so equality is total
impl Eq for Value {}

// =============================================================================
// Hashing
// =============================================================================

/// Feeds the canonical hash bytes of a float: integral floats hash as the
/// integer they carry, everything else by (NaN-canonicalized) bits.
fn hash_f64<H: Hasher>(value: f64, state: &mut H) {
    if float_is_integral(value) {
        state.write_u8(2);
        state.write_i64(value as i64);
    } else {
        state.write_u8(3);
        let bits = if value.is_nan() {
            f64::NAN.to_bits()
        } else {
            value.to_bits()
        };
        state.write_u64(bits);
    }
}

/// Kind tag shared by every sequential value so equal sequences hash equal
/// across representations.
const SEQUENTIAL_TAG: u8 = 7;

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Nil => state.write_u8(0),
            Value::Bool(value) => {
                state.write_u8(1);
                state.write_u8(u8::from(*value));
            }
            Value::Int(value) => {
                state.write_u8(2);
                state.write_i64(*value);
            }
            Value::Float(value) => hash_f64(*value, state),
            Value::Str(value) => {
                state.write_u8(4);
                state.write(value.as_bytes());
            }
            Value::Keyword(value) => {
                state.write_u8(5);
                state.write(value.name().as_bytes());
            }
            Value::Symbol(value) => {
                state.write_u8(6);
                state.write(value.name().as_bytes());
            }
            Value::Vector(vector) => {
                state.write_u8(SEQUENTIAL_TAG);
                state.write_u32(ordered_hash(vector.iter().map(hash_value)));
            }
            Value::DoubleVector(vector) => {
                state.write_u8(SEQUENTIAL_TAG);
                state.write_u32(ordered_hash(vector.iter().map(|element| {
                    let mut hasher = new_hasher();
                    hash_f64(*element, &mut hasher);
                    hasher.finish() as u32
                })));
            }
            Value::IntVector(vector) => {
                state.write_u8(SEQUENTIAL_TAG);
                state.write_u32(ordered_hash(vector.iter().map(|element| {
                    let mut hasher = new_hasher();
                    hasher.write_u8(2);
                    hasher.write_i64(*element);
                    hasher.finish() as u32
                })));
            }
            Value::SortedVector(vector) => {
                state.write_u8(SEQUENTIAL_TAG);
                state.write_u32(ordered_hash(vector.iter().map(hash_value)));
            }
            Value::Cons(_) | Value::LazySeq(_) => {
                state.write_u8(SEQUENTIAL_TAG);
                let hashes = SeqIter::new(self.clone())
                    .map(|item| item.map_or(0, |element| hash_value(&element)));
                state.write_u32(ordered_hash(hashes));
            }
            Value::Map(map) => {
                // Order-independent so construction history is invisible
                state.write_u8(8);
                let mut sum: u32 = 0;
                for (key, value) in map.iter() {
                    let mut hasher = new_hasher();
                    key.hash(&mut hasher);
                    value.hash(&mut hasher);
                    sum = sum.wrapping_add(hasher.finish() as u32);
                }
                state.write_usize(map.len());
                state.write_u32(sum);
            }
            Value::Set(set) => {
                state.write_u8(9);
                let mut sum: u32 = 0;
                for element in set.iter() {
                    sum = sum.wrapping_add(hash_value(element));
                }
                state.write_usize(set.len());
                state.write_u32(sum);
            }
        }
    }
}

#[cfg(feature = "ahash")]
fn new_hasher() -> ahash::AHasher {
    ahash::AHasher::default()
}

#[cfg(all(feature = "fxhash", not(feature = "ahash")))]
fn new_hasher() -> rustc_hash::FxHasher {
    rustc_hash::FxHasher::default()
}

#[cfg(not(any(feature = "ahash", feature = "fxhash")))]
fn new_hasher() -> std::collections::hash_map::DefaultHasher {
    std::collections::hash_map::DefaultHasher::new()
}

/// Folds element hashes left to right with the shared sequential formula.
fn ordered_hash(hashes: impl Iterator<Item = u32>) -> u32 {
    let mut combined: u32 = 1;
    let mut count: u32 = 0;
    for hash in hashes {
        combined = combined.wrapping_mul(31).wrapping_add(hash);
        count = count.wrapping_add(1);
    }
    combined.wrapping_add(count)
}

/// The stable 32-bit hash projection of a value.
///
/// Equal values (by [`Value`] equality) always produce equal hashes.
#[must_use]
pub fn hash_value(value: &Value) -> u32 {
    let mut hasher = new_hasher();
    value.hash(&mut hasher);
    hasher.finish() as u32
}

// =============================================================================
// Ordering
// =============================================================================

/// Compares two values, failing with [`PdsError::TypeMismatch`] on
/// uncomparable kinds.
///
/// `nil` sorts before everything; numbers compare across integer/float
/// kinds; strings, keywords, symbols, and booleans compare within their
/// kind; sequential values compare lexicographically.
pub fn compare(left: &Value, right: &Value) -> Result<Ordering> {
    match (left, right) {
        (Value::Nil, Value::Nil) => Ok(Ordering::Equal),
        (Value::Nil, _) => Ok(Ordering::Less),
        (_, Value::Nil) => Ok(Ordering::Greater),
        (Value::Bool(first), Value::Bool(second)) => Ok(first.cmp(second)),
        (Value::Int(first), Value::Int(second)) => Ok(first.cmp(second)),
        (Value::Str(first), Value::Str(second)) => Ok(first.cmp(second)),
        (Value::Keyword(first), Value::Keyword(second)) => Ok(first.cmp(second)),
        (Value::Symbol(first), Value::Symbol(second)) => Ok(first.cmp(second)),
        (first, second) if first.is_sequential() && second.is_sequential() => {
            sequential_compare(first, second)
        }
        _ => {
            let (Some(first), Some(second)) = (left.as_f64(), right.as_f64()) else {
                return Err(PdsError::TypeMismatch {
                    expected: "comparable values of one kind",
                    actual: right.kind(),
                });
            };
            first.partial_cmp(&second).ok_or(PdsError::TypeMismatch {
                expected: "comparable number",
                actual: "NaN",
            })
        }
    }
}

// =============================================================================
// Display
// =============================================================================

/// Writes a sequence in list notation, `(1 2 3)`. Forces lazy tails.
fn write_seq(value: &Value, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(formatter, "(")?;
    let mut first = true;
    for item in SeqIter::new(value.clone()) {
        if !first {
            write!(formatter, " ")?;
        }
        first = false;
        match item {
            Ok(element) => write!(formatter, "{element}")?,
            Err(_) => {
                write!(formatter, "...")?;
                break;
            }
        }
    }
    write!(formatter, ")")
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(formatter, "nil"),
            Value::Bool(value) => write!(formatter, "{value}"),
            Value::Int(value) => write!(formatter, "{value}"),
            Value::Float(value) => {
                if float_is_integral(*value) && value.is_finite() {
                    write!(formatter, "{value:.1}")
                } else {
                    write!(formatter, "{value}")
                }
            }
            Value::Str(value) => write!(formatter, "{value:?}"),
            Value::Keyword(value) => write!(formatter, "{value}"),
            Value::Symbol(value) => write!(formatter, "{value}"),
            Value::Vector(vector) => {
                write!(formatter, "[")?;
                for (index, element) in vector.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                write!(formatter, "]")
            }
            Value::DoubleVector(vector) => {
                write!(formatter, "[")?;
                for (index, element) in vector.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                write!(formatter, "]")
            }
            Value::IntVector(vector) => {
                write!(formatter, "[")?;
                for (index, element) in vector.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                write!(formatter, "]")
            }
            Value::SortedVector(vector) => {
                write!(formatter, "[")?;
                for (index, element) in vector.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                write!(formatter, "]")
            }
            Value::Map(map) => {
                write!(formatter, "{{")?;
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, ", ")?;
                    }
                    write!(formatter, "{key} {value}")?;
                }
                write!(formatter, "}}")
            }
            Value::Set(set) => {
                write!(formatter, "#{{")?;
                for (index, element) in set.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                write!(formatter, "}}")
            }
            Value::Cons(_) | Value::LazySeq(_) => write_seq(self, formatter),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, formatter)
    }
}

// =============================================================================
// Tests
// =============================================================================
