//! Read-only projections over the inventory store.
//!
//! Nothing here mutates state or enforces invariants. Each listing reflects
//! committed transitions only; `snapshot` and `audit` read drums and grids
//! from the same commit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use drumyard_core::DrumId;
use drumyard_inventory::{
    Drum, Grid, HistoryRecord, InvariantBreach, InventorySnapshot, TransactionRecord,
};

use crate::error::InventoryError;
use crate::store::{DrumFilter, GridFilter, InventoryStore};

/// Outcome of cross-checking drums against grids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub revision: u64,
    pub consistent: bool,
    pub breaches: Vec<InvariantBreach>,
}

pub struct InventoryQueries<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for InventoryQueries<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: InventoryStore + ?Sized> InventoryQueries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_drums(&self) -> Result<Vec<Drum>, InventoryError> {
        Ok(self.store.drums(&DrumFilter::All).await?)
    }

    pub async fn list_grids(&self) -> Result<Vec<Grid>, InventoryError> {
        Ok(self.store.grids(GridFilter::All).await?)
    }

    pub async fn list_available_grids(&self) -> Result<Vec<Grid>, InventoryError> {
        Ok(self.store.grids(GridFilter::Available).await?)
    }

    /// Exact, case-sensitive match on the drum's current `order_ref`.
    ///
    /// A blank order matches nothing, not the drums whose refs were cleared on retrieval.
    pub async fn find_drums_by_order(&self, order_ref: &str) -> Result<Vec<Drum>, InventoryError> {
        if order_ref.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .drums(&DrumFilter::Order(order_ref.to_string()))
            .await?)
    }

    pub async fn list_history(&self) -> Result<Vec<HistoryRecord>, InventoryError> {
        Ok(self.store.history().await?)
    }

    /// The transaction log, optionally narrowed to one drum.
    pub async fn list_transactions(
        &self,
        drum_id: Option<&str>,
    ) -> Result<Vec<TransactionRecord>, InventoryError> {
        let drum_id = drum_id.map(DrumId::new).transpose()?;
        Ok(self.store.transactions(drum_id.as_ref()).await?)
    }

    pub async fn get_drum(&self, drum_id: &str) -> Result<Drum, InventoryError> {
        let drum_id = DrumId::new(drum_id)?;
        self.store
            .drum(&drum_id)
            .await?
            .ok_or(InventoryError::DrumNotFound(drum_id))
    }

    pub async fn snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        Ok(self.store.snapshot().await?)
    }

    pub async fn audit(&self) -> Result<AuditReport, InventoryError> {
        let snapshot = self.store.snapshot().await?;
        let breaches = snapshot.verify();
        if !breaches.is_empty() {
            tracing::error!(
                revision = snapshot.revision,
                breaches = breaches.len(),
                "inventory audit found invariant breaches"
            );
        }
        Ok(AuditReport {
            revision: snapshot.revision,
            consistent: breaches.is_empty(),
            breaches,
        })
    }

    pub async fn revision(&self) -> Result<u64, InventoryError> {
        Ok(self.store.revision().await?)
    }
}
