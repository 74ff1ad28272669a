//! Error taxonomy for core operations.
//!
//! Every failure leaves persisted state unchanged: validation runs before
//! any write, and in-flight transactions roll back when dropped.

use thiserror::Error;

/// Errors that can occur in core APO operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced plantation, header, or item does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A role or state precondition was violated.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed input: negative or non-finite quantity, future planting
    /// year, or a draft with nothing to price.
    #[error("{0}")]
    Validation(String),

    /// The prospective revised total would exceed the header's sanctioned
    /// amount. Carries both figures so callers can explain the rejection.
    #[error("revised total {attempted} exceeds sanctioned amount {ceiling}")]
    BudgetExceeded { attempted: f64, ceiling: f64 },

    /// An optimistic status transition lost its race with a concurrent
    /// update. Safe for the caller to retry.
    #[error("{0}")]
    Conflict(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
