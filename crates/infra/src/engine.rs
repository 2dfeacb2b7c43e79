//! Inventory engine: the single mutation entry point.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! raw labels
//!   ↓
//! 1. Normalise into DrumId / GridId (InvalidInput only for blank or overlong labels)
//!   ↓
//! 2. Hand the transition to the store, which loads the current rows, asks the
//!    domain for the next state and commits it atomically
//!   ↓
//! 3. Map StoreError / DomainError into InventoryError, log the outcome
//! ```
//!
//! The engine holds no inventory state of its own. The store handle is
//! injected, so the same engine runs against SQLite in production and the
//! in-memory store in tests.
//!
//! ## Reset exclusion
//!
//! `reset_all` takes the engine's gate exclusively; placements, retrievals and
//! registrations hold it shared. Within one process a reset therefore never
//! interleaves with an in-flight transition. Across processes the store's own
//! write lock serializes the operations.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use drumyard_core::{DrumId, GridId};
use drumyard_inventory::{Drum, GridLayout};

use crate::error::{InventoryError, StoreError};
use crate::queries::InventoryQueries;
use crate::store::{CommittedPlacement, CommittedRetrieval, InventoryStore};

/// Drives drum registration, placement, retrieval and reset against a store.
pub struct InventoryEngine<S: ?Sized> {
    store: Arc<S>,
    layout: GridLayout,
    gate: RwLock<()>,
}

impl<S: InventoryStore + ?Sized> InventoryEngine<S> {
    pub fn new(store: Arc<S>, layout: GridLayout) -> Self {
        Self {
            store,
            layout,
            gate: RwLock::new(()),
        }
    }

    /// Read-only façade sharing this engine's store.
    pub fn queries(&self) -> InventoryQueries<S> {
        InventoryQueries::new(Arc::clone(&self.store))
    }

    /// Prepare the store and seed any missing grid slot. Safe to call on every start.
    #[instrument(skip_all, err)]
    pub async fn initialize(&self) -> Result<usize, InventoryError> {
        let seeded = self.store.initialize(&self.layout).await?;
        tracing::info!(seeded, slots = self.layout.len(), "grid layout initialized");
        Ok(seeded)
    }

    /// Create a drum (status OUT) or re-stage an OUT drum with new order/material refs.
    #[instrument(skip_all, fields(drum_id = %drum_id))]
    pub async fn register_or_update_drum(
        &self,
        drum_id: &str,
        order_ref: &str,
        material_ref: &str,
    ) -> Result<Drum, InventoryError> {
        let drum_id = DrumId::new(drum_id)?;
        let _shared = self.gate.read().await;

        let result = self
            .store
            .register_drum(&drum_id, order_ref, material_ref, Utc::now())
            .await;
        match result {
            Ok(registration) => {
                tracing::info!(
                    drum_id = %drum_id,
                    order_ref,
                    material_ref,
                    created = registration.is_created(),
                    "drum registered"
                );
                Ok(registration.into_drum())
            }
            Err(e) => Err(rejected("register_or_update_drum", e)),
        }
    }

    /// IN transition: put a registered OUT drum into an Available grid.
    #[instrument(skip_all, fields(drum_id = %drum_id, grid_id = %grid_id))]
    pub async fn place_drum(
        &self,
        drum_id: &str,
        grid_id: &str,
    ) -> Result<CommittedPlacement, InventoryError> {
        let drum_id = DrumId::new(drum_id)?;
        let grid_id = GridId::new(grid_id)?;
        let _shared = self.gate.read().await;

        match self.store.place_drum(&drum_id, &grid_id, Utc::now()).await {
            Ok(placement) => {
                tracing::info!(
                    drum_id = %drum_id,
                    grid_id = %grid_id,
                    seq = placement.transaction.seq,
                    "drum placed"
                );
                Ok(placement)
            }
            Err(e) => Err(rejected("place_drum", e)),
        }
    }

    /// OUT transition: vacate the drum's grid, recording its context in history first.
    #[instrument(skip_all, fields(drum_id = %drum_id))]
    pub async fn retrieve_drum(&self, drum_id: &str) -> Result<CommittedRetrieval, InventoryError> {
        let drum_id = DrumId::new(drum_id)?;
        let _shared = self.gate.read().await;

        match self.store.retrieve_drum(&drum_id, Utc::now()).await {
            Ok(retrieval) => {
                tracing::info!(
                    drum_id = %drum_id,
                    grid_id = %retrieval.history.grid_id,
                    seq = retrieval.transaction.seq,
                    "drum retrieved"
                );
                Ok(retrieval)
            }
            Err(e) => Err(rejected("retrieve_drum", e)),
        }
    }

    /// Clear every drum, transaction and history record and re-seed all grids.
    #[instrument(skip_all)]
    pub async fn reset_all(&self) -> Result<(), InventoryError> {
        let _exclusive = self.gate.write().await;

        match self.store.reset(&self.layout).await {
            Ok(()) => {
                tracing::warn!(slots = self.layout.len(), "inventory reset");
                Ok(())
            }
            Err(e) => Err(rejected("reset_all", e)),
        }
    }
}

/// Log a failed transition at the level its kind deserves and convert it.
fn rejected(operation: &'static str, err: StoreError) -> InventoryError {
    match &err {
        StoreError::Domain(reason) if reason.is_rejection() => {
            tracing::warn!(operation, reason = %reason, "transition rejected");
        }
        _ => {
            tracing::error!(operation, error = %err, "transition failed");
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryInventoryStore;

    fn engine() -> InventoryEngine<InMemoryInventoryStore> {
        InventoryEngine::new(Arc::new(InMemoryInventoryStore::new()), GridLayout::default())
    }

    #[tokio::test]
    async fn labels_are_normalized_before_reaching_the_store() {
        let engine = engine();
        engine.initialize().await.unwrap();
        engine.register_or_update_drum(" d001 ", "O-100", "M1").await.unwrap();
        let placed = engine.place_drum("D001", "a1").await.unwrap();

        assert_eq!(placed.drum.id_typed().as_str(), "D001");
        assert_eq!(placed.grid.id_typed().as_str(), "A1");
    }

    #[tokio::test]
    async fn blank_labels_are_invalid_input() {
        let engine = engine();
        engine.initialize().await.unwrap();

        let err = engine.register_or_update_drum("  ", "O", "M").await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidInput(_)));

        let err = engine.place_drum("D1", "").await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn odd_labels_resolve_to_lookup_failures() {
        let engine = engine();
        engine.initialize().await.unwrap();
        engine.register_or_update_drum("D1", "O", "M").await.unwrap();

        let err = engine.place_drum("D1", "A 1").await.unwrap_err();
        assert_eq!(err, InventoryError::GridUnavailable(GridId::new("A 1").unwrap()));

        let err = engine.place_drum("D/9", "A1").await.unwrap_err();
        assert_eq!(err, InventoryError::DrumNotFound(DrumId::new("D/9").unwrap()));

        let drum = engine.register_or_update_drum("Drum 7", "O", "M").await.unwrap();
        assert_eq!(drum.id_typed().as_str(), "DRUM 7");
        engine.place_drum("drum 7", "B1").await.unwrap();
    }

    #[tokio::test]
    async fn unregistered_drum_is_not_found() {
        let engine = engine();
        engine.initialize().await.unwrap();

        let err = engine.place_drum("D404", "A1").await.unwrap_err();
        assert_eq!(err, InventoryError::DrumNotFound(DrumId::new("D404").unwrap()));
    }

    #[tokio::test]
    async fn unknown_grid_is_unavailable() {
        let engine = engine();
        engine.initialize().await.unwrap();
        engine.register_or_update_drum("D1", "O", "M").await.unwrap();

        let err = engine.place_drum("D1", "Z9").await.unwrap_err();
        assert_eq!(err, InventoryError::GridUnavailable(GridId::new("Z9").unwrap()));
    }

    #[tokio::test]
    async fn placed_drum_cannot_be_restaged_or_placed_twice() {
        let engine = engine();
        engine.initialize().await.unwrap();
        engine.register_or_update_drum("D1", "O", "M").await.unwrap();
        engine.place_drum("D1", "A1").await.unwrap();

        let err = engine.register_or_update_drum("D1", "O2", "M2").await.unwrap_err();
        assert!(matches!(err, InventoryError::DrumAlreadyPlaced(_)));
        let err = engine.place_drum("D1", "A2").await.unwrap_err();
        assert!(matches!(err, InventoryError::DrumAlreadyPlaced(_)));
        let err = engine.place_drum("D1", "Z9").await.unwrap_err();
        assert!(matches!(err, InventoryError::DrumAlreadyPlaced(_)));

        let grids = engine.queries().list_available_grids().await.unwrap();
        assert_eq!(grids.len(), 8);
    }

    #[tokio::test]
    async fn restage_overwrites_refs_of_out_drum() {
        let engine = engine();
        engine.initialize().await.unwrap();
        engine.register_or_update_drum("D1", "O1", "M1").await.unwrap();
        let drum = engine.register_or_update_drum("D1", "O2", "M2").await.unwrap();

        assert_eq!(drum.order_ref(), "O2");
        assert_eq!(drum.material_ref(), "M2");
        assert!(!drum.is_placed());
    }
}
