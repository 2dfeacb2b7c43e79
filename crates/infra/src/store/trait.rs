use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drumyard_core::{DrumId, GridId};
use drumyard_inventory::{
    Drum, Grid, GridLayout, HistoryRecord, InventorySnapshot, Registration, TransactionRecord,
};

use crate::error::StoreError;

/// Which drums a listing returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DrumFilter {
    #[default]
    All,
    /// Exact, case-sensitive match on `order_ref`.
    Order(String),
}

impl DrumFilter {
    pub fn order_ref(&self) -> Option<&str> {
        match self {
            DrumFilter::All => None,
            DrumFilter::Order(o) => Some(o.as_str()),
        }
    }
}

/// Which grids a listing returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GridFilter {
    #[default]
    All,
    Available,
}

/// State written by a successful IN transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedPlacement {
    pub drum: Drum,
    pub grid: Grid,
    pub transaction: TransactionRecord,
}

/// State written by a successful OUT transition.
///
/// `history` carries the order/material context the live drum no longer has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedRetrieval {
    pub history: HistoryRecord,
    pub drum: Drum,
    pub grid: Grid,
    pub transaction: TransactionRecord,
}

/// Storage boundary for the inventory engine.
///
/// Mutations either commit completely or return an error with nothing
/// written. Reads only ever observe committed transitions. Listings are
/// ordered by id (drums, grids) or by sequence number (history, transactions).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Prepare storage and insert any layout slot that does not exist yet.
    ///
    /// Idempotent; returns how many slots were newly created.
    async fn initialize(&self, layout: &GridLayout) -> Result<usize, StoreError>;

    async fn register_drum(
        &self,
        drum_id: &DrumId,
        order_ref: &str,
        material_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration, StoreError>;

    async fn place_drum(
        &self,
        drum_id: &DrumId,
        grid_id: &GridId,
        now: DateTime<Utc>,
    ) -> Result<CommittedPlacement, StoreError>;

    async fn retrieve_drum(
        &self,
        drum_id: &DrumId,
        now: DateTime<Utc>,
    ) -> Result<CommittedRetrieval, StoreError>;

    /// Delete every drum, transaction and history record and re-seed all
    /// layout slots as Available. Sequence numbers are not rewound.
    async fn reset(&self, layout: &GridLayout) -> Result<(), StoreError>;

    async fn drum(&self, drum_id: &DrumId) -> Result<Option<Drum>, StoreError>;

    async fn drums(&self, filter: &DrumFilter) -> Result<Vec<Drum>, StoreError>;

    async fn grids(&self, filter: GridFilter) -> Result<Vec<Grid>, StoreError>;

    async fn history(&self) -> Result<Vec<HistoryRecord>, StoreError>;

    async fn transactions(
        &self,
        drum_id: Option<&DrumId>,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Drums and grids read from one committed state.
    async fn snapshot(&self) -> Result<InventorySnapshot, StoreError>;

    /// Counter bumped by every committed write; lets pollers skip unchanged reads.
    async fn revision(&self) -> Result<u64, StoreError>;
}
