//! Append-only audit records.
//!
//! Transitions produce *pending* entries (no sequence number). The store
//! assigns the next sequence number when it persists them, mirroring the
//! split between a decision and its durable record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drumyard_core::{DomainError, DrumId, GridId};

/// Direction of a grid transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            other => Err(DomainError::validation(format!("unknown direction '{other}'"))),
        }
    }
}

/// A placement/retrieval event not yet written to the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub drum_id: DrumId,
    pub grid_id: GridId,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn into_record(self, seq: u64) -> TransactionRecord {
        TransactionRecord {
            seq,
            drum_id: self.drum_id,
            grid_id: self.grid_id,
            direction: self.direction,
            timestamp: self.timestamp,
        }
    }
}

/// One immutable entry of the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonically increasing position in the log.
    pub seq: u64,
    pub drum_id: DrumId,
    pub grid_id: GridId,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

/// Order/material context captured at retrieval, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingHistory {
    pub drum_id: DrumId,
    pub order_ref: String,
    pub material_ref: String,
    pub grid_id: GridId,
    pub timestamp: DateTime<Utc>,
}

impl PendingHistory {
    pub fn into_record(self, seq: u64) -> HistoryRecord {
        HistoryRecord {
            seq,
            drum_id: self.drum_id,
            order_ref: self.order_ref,
            material_ref: self.material_ref,
            grid_id: self.grid_id,
            timestamp: self.timestamp,
        }
    }
}

/// Immutable snapshot of a drum's context at the moment it left its grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub seq: u64,
    pub drum_id: DrumId,
    pub order_ref: String,
    pub material_ref: String,
    /// The grid the drum vacated.
    pub grid_id: GridId,
    pub timestamp: DateTime<Utc>,
}
