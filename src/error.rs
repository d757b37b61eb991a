//! Crate-wide error type.
//!
//! Every fallible constructor in this crate returns `Result<_, CoreError>` through a
//! `..._r` function and additionally exposes a plain-named panicking wrapper for call
//! sites that have already validated the precondition out of band.

use thiserror::Error;

/// The three error kinds recognised by this crate (§7 of the design notes).
///
/// `non_convergence` deliberately has no variant here: CG exhausting `max_iter` is not
/// an error, it is reported through the solver's return value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An index fell outside its declared range (subgroup position, coordinate, etc).
    #[error("range error: {detail}")]
    Range {
        /// Human-readable detail of what was out of range.
        detail: String,
    },
    /// Two operands that must share a shape (layout, site size, dimension) did not.
    #[error("shape error: {detail}")]
    Shape {
        /// Human-readable detail of the mismatched shapes.
        detail: String,
    },
    /// An argument violated a precondition unrelated to range or shape.
    #[error("invalid argument: {detail}")]
    InvalidArgument {
        /// Human-readable detail of the violated precondition.
        detail: String,
    },
}

impl CoreError {
    /// Build a [`CoreError::Range`] with the given detail message.
    pub fn range(detail: impl Into<String>) -> Self {
        CoreError::Range {
            detail: detail.into(),
        }
    }

    /// Build a [`CoreError::Shape`] with the given detail message.
    pub fn shape(detail: impl Into<String>) -> Self {
        CoreError::Shape {
            detail: detail.into(),
        }
    }

    /// Build a [`CoreError::InvalidArgument`] with the given detail message.
    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            detail: detail.into(),
        }
    }
}

/// Convenience alias used throughout the crate's fallible APIs.
pub type CoreResult<T> = Result<T, CoreError>;
