//! Drum inventory domain module.
//!
//! Business rules for drums moving in and out of fixed grid slots,
//! implemented as deterministic domain logic (no IO, no storage). Stores load
//! the current records, ask these types for the next state, and persist the
//! result atomically.

pub mod drum;
pub mod grid;
pub mod ledger;
pub mod snapshot;

pub use drum::{Drum, DrumLookup, DrumStatus, Placement, Registration, Retrieval, register};
pub use grid::{Grid, GridLayout, GridStatus};
pub use ledger::{Direction, HistoryRecord, PendingHistory, PendingTransaction, TransactionRecord};
pub use snapshot::{InvariantBreach, InventorySnapshot};
