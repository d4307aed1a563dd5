//! The memoized thunk cell behind lazy sequences.
//!
//! A [`LazySeq`] defers a producer until the sequence is first observed.
//! Forcing is memoized: the producer runs at most once, and every later
//! observation returns the cached realization. The cell has three states:
//!
//! - *unrealized*: holds the producer
//! - *realized*: holds the produced sequence (nil or a cons cell)
//! - *poisoned*: the producer failed, or the cell was forced re-entrantly
//!
//! While the producer runs the cell reads as poisoned, so a producer that
//! (incorrectly) forces its own cell gets an error instead of a deadlock.
//! Once poisoned, every later force reports [`PdsError::LazySeqPoisoned`].
//!
//! Forcing collapses chains: a producer may return another lazy sequence
//! (or any seqable collection), and the cell walks to a realized seq view
//! before caching it.
//!
//! # Thread model
//!
//! Forcing is single-owner, like the transients: a `LazySeq` is not `Sync`
//! and must be forced from the thread that owns the surrounding sequence.

use std::cell::RefCell;
use std::fmt;

use crate::error::{PdsError, Result};
use crate::value::Value;

/// The deferred producer of a sequence.
type Thunk = Box<dyn FnOnce() -> Result<Value>>;

/// Cell states. The thunk is consumed on the transition out of
/// `Unrealized`.
enum LazyState {
    /// Not yet forced; holds the producer
    Unrealized(Thunk),
    /// Forced; holds the realized seq (nil or cons)
    Realized(Value),
    /// The producer failed or was forced re-entrantly
    Poisoned,
}

/// A lazily realized sequence cell with memoization.
///
/// # Examples
///
/// ```rust
/// use spork_pds::seq::{LazySeq, cons};
/// use spork_pds::value::Value;
///
/// let lazy = LazySeq::new(|| cons(Value::Int(1), Value::Nil));
/// assert!(!lazy.is_realized());
///
/// let realized = lazy.force().unwrap();
/// assert!(lazy.is_realized());
/// assert!(matches!(realized, Value::Cons(_)));
/// ```
pub struct LazySeq {
    state: RefCell<LazyState>,
}

impl LazySeq {
    /// Creates a cell around a producer.
    ///
    /// The producer may return nil, a cons cell, another lazy sequence, or
    /// any seqable collection; forcing coerces the result to a seq view.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce() -> Result<Value> + 'static,
    {
        Self {
            state: RefCell::new(LazyState::Unrealized(Box::new(producer))),
        }
    }

    /// Returns `true` once the cell has been forced successfully.
    #[must_use]
    pub fn is_realized(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Realized(_))
    }

    /// Forces the cell, returning the realized seq view (nil or a cons
    /// cell).
    ///
    /// The producer runs at most once; later calls return the cached
    /// value. A failed producer poisons the cell.
    pub fn force(&self) -> Result<Value> {
        {
            let state = self.state.borrow();
            match &*state {
                LazyState::Realized(value) => return Ok(value.clone()),
                LazyState::Poisoned => return Err(PdsError::LazySeqPoisoned),
                LazyState::Unrealized(_) => {}
            }
        }

        // Take the thunk out, leaving the cell poisoned while the producer
        // runs; a re-entrant force observes the poisoned state
        let thunk = match std::mem::replace(&mut *self.state.borrow_mut(), LazyState::Poisoned) {
            LazyState::Unrealized(thunk) => thunk,
            LazyState::Realized(value) => {
                *self.state.borrow_mut() = LazyState::Realized(value.clone());
                return Ok(value);
            }
            LazyState::Poisoned => return Err(PdsError::LazySeqPoisoned),
        };

        let produced = thunk()?;
        let realized = collapse(produced)?;
        *self.state.borrow_mut() = LazyState::Realized(realized.clone());
        Ok(realized)
    }
}

/// Walks chained lazy sequences and seqable collections down to a realized
/// seq view.
fn collapse(mut value: Value) -> Result<Value> {
    loop {
        match value {
            Value::Nil | Value::Cons(_) => return Ok(value),
            Value::LazySeq(lazy) => value = lazy.force()?,
            other => value = super::seq(&other)?,
        }
    }
}

impl fmt::Debug for LazySeq {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            LazyState::Unrealized(_) => "unrealized",
            LazyState::Realized(_) => "realized",
            LazyState::Poisoned => "poisoned",
        };
        formatter
            .debug_struct("LazySeq")
            .field("state", &state)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::cons;
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    #[rstest]
    fn test_force_is_memoized() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy = LazySeq::new(move || {
            counter.set(counter.get() + 1);
            cons(Value::Int(42), Value::Nil)
        });

        assert_eq!(calls.get(), 0);
        let first = lazy.force().unwrap();
        let second = lazy.force().unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
    }

    #[rstest]
    fn test_failed_producer_poisons() {
        let lazy = LazySeq::new(|| {
            Err(PdsError::UnsupportedOperation {
                operation: "seq",
                target: "integer",
            })
        });
        assert!(lazy.force().is_err());
        assert_eq!(lazy.force(), Err(PdsError::LazySeqPoisoned));
        assert!(!lazy.is_realized());
    }

    #[rstest]
    fn test_collapses_chained_lazy_seqs() {
        let outer =
            LazySeq::new(|| Ok(crate::seq::lazy_seq(|| cons(Value::Int(1), Value::Nil))));
        let realized = outer.force().unwrap();
        assert!(matches!(realized, Value::Cons(_)));
    }

    #[rstest]
    fn test_empty_collection_realizes_to_nil() {
        let lazy = LazySeq::new(|| Ok(Value::Vector(crate::persistent::PersistentVector::new())));
        assert_eq!(lazy.force().unwrap(), Value::Nil);
    }
}
