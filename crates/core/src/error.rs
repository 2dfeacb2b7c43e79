//! Domain error model.

use thiserror::Error;

use crate::id::{DrumId, GridId};

/// Domain-level error.
///
/// Deterministic business failures only (validation, rejected transitions,
/// invariants). Storage and connectivity failures belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (empty, too long, bad characters).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The referenced drum has never been registered.
    #[error("drum {0} not found")]
    DrumNotFound(DrumId),

    /// The target grid does not exist or is already occupied.
    #[error("grid {0} is not available")]
    GridUnavailable(GridId),

    /// Retrieval requested for a drum that is not currently IN.
    #[error("drum {0} is not placed in any grid")]
    DrumNotPlaced(DrumId),

    /// The drum is currently IN and the requested transition needs it OUT.
    #[error("drum {0} is already placed")]
    DrumAlreadyPlaced(DrumId),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Whether the error is a rejected transition (as opposed to bad input or
    /// a broken invariant).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DrumNotFound(_)
                | Self::GridUnavailable(_)
                | Self::DrumNotPlaced(_)
                | Self::DrumAlreadyPlaced(_)
        )
    }
}
