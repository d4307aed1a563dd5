//! Error types surfaced by the collection runtime.
//!
//! Every fallible operation returns [`PdsError`] through the crate-wide
//! [`Result`] alias. The library never catches, retries, or logs: errors
//! propagate to the calling layer, and a failing operation leaves its
//! inputs untouched (a failed transient mutation preserves the transient's
//! prior contents).

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PdsError>;

/// Errors raised by collection and sequence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdsError {
    /// An index was outside the valid range of a vector or sequence.
    IndexOutOfRange {
        /// The requested index (as supplied by the caller).
        index: i64,
        /// The length of the collection at the time of the call.
        length: usize,
    },
    /// A key was absent and the caller explicitly requested an error
    /// instead of a default value.
    KeyNotFound {
        /// Display representation of the missing key.
        key: String,
    },
    /// The operation is not defined for the target collection kind.
    UnsupportedOperation {
        /// The operation that was attempted.
        operation: &'static str,
        /// The kind of value it was attempted on.
        target: &'static str,
    },
    /// An operation received the wrong number or shape of arguments.
    ArityMismatch {
        /// The operation that was attempted.
        operation: &'static str,
        /// What the operation expected.
        expected: &'static str,
    },
    /// A transient was used after `persistent!` invalidated it, which also
    /// covers handles smuggled across an invalidation boundary.
    TransientUsedAfterPersistent,
    /// A value had the wrong type for the operation (a non-numeric element
    /// for a primitive vector, an uncomparable sort key, ...).
    TypeMismatch {
        /// What the operation expected.
        expected: &'static str,
        /// The kind of value it received.
        actual: &'static str,
    },
    /// A lazy sequence's producer failed (or was forced re-entrantly);
    /// the cell is poisoned and every later force reports this.
    LazySeqPoisoned,
}

impl fmt::Display for PdsError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, length } => {
                write!(formatter, "index {index} out of range for length {length}")
            }
            Self::KeyNotFound { key } => write!(formatter, "key not found: {key}"),
            Self::UnsupportedOperation { operation, target } => {
                write!(formatter, "{operation} is not supported on {target}")
            }
            Self::ArityMismatch {
                operation,
                expected,
            } => {
                write!(formatter, "{operation} expects {expected}")
            }
            Self::TransientUsedAfterPersistent => {
                write!(formatter, "transient used after persistent!")
            }
            Self::TypeMismatch { expected, actual } => {
                write!(formatter, "expected {expected}, got {actual}")
            }
            Self::LazySeqPoisoned => write!(formatter, "lazy sequence is poisoned"),
        }
    }
}

impl std::error::Error for PdsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_display_index_out_of_range() {
        let error = PdsError::IndexOutOfRange {
            index: -1,
            length: 3,
        };
        assert_eq!(error.to_string(), "index -1 out of range for length 3");
    }

    #[rstest]
    fn test_display_unsupported_operation() {
        let error = PdsError::UnsupportedOperation {
            operation: "nth",
            target: "map",
        };
        assert_eq!(error.to_string(), "nth is not supported on map");
    }

    #[rstest]
    fn test_display_transient_used_after_persistent() {
        assert_eq!(
            PdsError::TransientUsedAfterPersistent.to_string(),
            "transient used after persistent!"
        );
    }
}
