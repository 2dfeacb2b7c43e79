//! Store and engine error types.

use thiserror::Error;

use drumyard_core::{DomainError, DrumId, GridId};

/// Store operation error.
///
/// Either the transition was refused by the domain rules (`Domain`), or the
/// store itself failed. In both cases nothing was committed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The domain rejected the transition inside the store transaction.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Lock contention that outlasted the busy timeout (transient).
    #[error("store busy: {0}")]
    Busy(String),

    /// The store refused a write on a schema constraint.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row could not be decoded into a domain record.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// Connection, IO or commit failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

/// Error reported by the inventory engine and query façade.
///
/// Every variant is a discrete, user-actionable outcome. Nothing was
/// partially applied when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("drum {0} not found")]
    DrumNotFound(DrumId),

    #[error("grid {0} is unavailable")]
    GridUnavailable(GridId),

    #[error("drum {0} is not placed")]
    DrumNotPlaced(DrumId),

    #[error("drum {0} is already placed")]
    DrumAlreadyPlaced(DrumId),

    /// Malformed caller input (bad id, etc).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Stored state contradicts the drum/grid invariants.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The durable store could not complete the operation; retry the whole call.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<DomainError> for InventoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::DrumNotFound(id) => InventoryError::DrumNotFound(id),
            DomainError::GridUnavailable(id) => InventoryError::GridUnavailable(id),
            DomainError::DrumNotPlaced(id) => InventoryError::DrumNotPlaced(id),
            DomainError::DrumAlreadyPlaced(id) => InventoryError::DrumAlreadyPlaced(id),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                InventoryError::InvalidInput(msg)
            }
            DomainError::InvariantViolation(msg) => InventoryError::InvariantViolation(msg),
        }
    }
}

impl From<StoreError> for InventoryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => e.into(),
            StoreError::Decode(msg) | StoreError::Constraint(msg) => {
                InventoryError::InvariantViolation(msg)
            }
            StoreError::Busy(msg) | StoreError::Unavailable(msg) => {
                InventoryError::StoreUnavailable(msg)
            }
        }
    }
}
