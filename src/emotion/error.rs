//! Domain error types
//!
//! Errors raised while building or parsing emotion domain values.

use thiserror::Error;

use super::types::UserId;

/// Errors that can occur when constructing domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmotionError {
    /// Rating outside the 0..=5 scale
    #[error("Invalid rating {0}: must be between 0 and 5")]
    InvalidRating(i64),

    /// Category label not recognised
    #[error("Unknown emotion category: {0}")]
    UnknownCategory(String),

    /// Selection text could not be parsed
    #[error("Invalid selection '{0}': expected YYYY-MM-DD, YYYY-Www, YYYY-MM or YYYY")]
    InvalidSelection(String),

    /// Timestamp text could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Entry belongs to a different user than the history it was added to
    #[error("Entry owned by {owner} cannot be added to the history of {expected}")]
    OwnerMismatch { expected: UserId, owner: UserId },
}

/// Result type alias for domain operations
pub type EmotionResult<T> = Result<T, EmotionError>;
