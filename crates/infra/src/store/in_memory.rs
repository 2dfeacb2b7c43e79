use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use drumyard_core::{DomainError, DrumId, GridId};
use drumyard_inventory::{
    Drum, DrumLookup, Grid, GridLayout, HistoryRecord, InventorySnapshot, Registration,
    TransactionRecord, register,
};

use super::r#trait::{CommittedPlacement, CommittedRetrieval, DrumFilter, GridFilter, InventoryStore};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct State {
    drums: BTreeMap<DrumId, Drum>,
    grids: BTreeMap<GridId, Grid>,
    transactions: Vec<TransactionRecord>,
    history: Vec<HistoryRecord>,
    last_transaction_seq: u64,
    last_history_seq: u64,
    revision: u64,
}

impl State {
    fn next_transaction_seq(&mut self) -> u64 {
        self.last_transaction_seq += 1;
        self.last_transaction_seq
    }

    fn next_history_seq(&mut self) -> u64 {
        self.last_history_seq += 1;
        self.last_history_seq
    }
}

/// In-memory inventory store.
///
/// Intended for tests/dev. One lock guards every table, so each transition
/// is decided and applied under the same write guard.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn initialize(&self, layout: &GridLayout) -> Result<usize, StoreError> {
        let mut state = self.write()?;
        let mut seeded = 0;
        for grid in layout.seed() {
            if !state.grids.contains_key(grid.id_typed()) {
                state.grids.insert(grid.id_typed().clone(), grid);
                seeded += 1;
            }
        }
        if seeded > 0 {
            state.revision += 1;
        }
        Ok(seeded)
    }

    async fn register_drum(
        &self,
        drum_id: &DrumId,
        order_ref: &str,
        material_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration, StoreError> {
        let mut state = self.write()?;
        let lookup = DrumLookup::from_option(drum_id, state.drums.get(drum_id).cloned());
        let registration = register(lookup, order_ref, material_ref, now)?;

        state
            .drums
            .insert(drum_id.clone(), registration.drum().clone());
        state.revision += 1;
        Ok(registration)
    }

    async fn place_drum(
        &self,
        drum_id: &DrumId,
        grid_id: &GridId,
        now: DateTime<Utc>,
    ) -> Result<CommittedPlacement, StoreError> {
        let mut state = self.write()?;

        let placement = {
            let drum = state
                .drums
                .get(drum_id)
                .ok_or_else(|| DomainError::DrumNotFound(drum_id.clone()))?;
            if drum.is_placed() {
                return Err(DomainError::DrumAlreadyPlaced(drum_id.clone()).into());
            }
            let grid = state
                .grids
                .get(grid_id)
                .ok_or_else(|| DomainError::GridUnavailable(grid_id.clone()))?;
            drum.place(grid, now)?
        };

        let seq = state.next_transaction_seq();
        let transaction = placement.transaction.into_record(seq);
        state.grids.insert(grid_id.clone(), placement.grid.clone());
        state.drums.insert(drum_id.clone(), placement.drum.clone());
        state.transactions.push(transaction.clone());
        state.revision += 1;

        Ok(CommittedPlacement {
            drum: placement.drum,
            grid: placement.grid,
            transaction,
        })
    }

    async fn retrieve_drum(
        &self,
        drum_id: &DrumId,
        now: DateTime<Utc>,
    ) -> Result<CommittedRetrieval, StoreError> {
        let mut state = self.write()?;

        let retrieval = {
            let drum = state
                .drums
                .get(drum_id)
                .ok_or_else(|| DomainError::DrumNotPlaced(drum_id.clone()))?;
            let Some(grid_id) = drum.current_grid() else {
                return Err(DomainError::DrumNotPlaced(drum_id.clone()).into());
            };
            let grid = state.grids.get(grid_id).ok_or_else(|| {
                DomainError::invariant(format!("drum {drum_id} references missing grid {grid_id}"))
            })?;
            drum.retrieve(grid, now)?
        };

        let history_seq = state.next_history_seq();
        let history = retrieval.history.into_record(history_seq);
        let transaction_seq = state.next_transaction_seq();
        let transaction = retrieval.transaction.into_record(transaction_seq);

        state.history.push(history.clone());
        state
            .drums
            .insert(drum_id.clone(), retrieval.drum.clone());
        state
            .grids
            .insert(retrieval.grid.id_typed().clone(), retrieval.grid.clone());
        state.transactions.push(transaction.clone());
        state.revision += 1;

        Ok(CommittedRetrieval {
            history,
            drum: retrieval.drum,
            grid: retrieval.grid,
            transaction,
        })
    }

    async fn reset(&self, layout: &GridLayout) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.drums.clear();
        state.transactions.clear();
        state.history.clear();
        state.grids = layout
            .seed()
            .into_iter()
            .map(|g| (g.id_typed().clone(), g))
            .collect();
        state.revision += 1;
        Ok(())
    }

    async fn drum(&self, drum_id: &DrumId) -> Result<Option<Drum>, StoreError> {
        Ok(self.read()?.drums.get(drum_id).cloned())
    }

    async fn drums(&self, filter: &DrumFilter) -> Result<Vec<Drum>, StoreError> {
        let state = self.read()?;
        Ok(state
            .drums
            .values()
            .filter(|d| filter.order_ref().is_none_or(|o| d.order_ref() == o))
            .cloned()
            .collect())
    }

    async fn grids(&self, filter: GridFilter) -> Result<Vec<Grid>, StoreError> {
        let state = self.read()?;
        Ok(state
            .grids
            .values()
            .filter(|g| filter == GridFilter::All || g.is_available())
            .cloned()
            .collect())
    }

    async fn history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.read()?.history.clone())
    }

    async fn transactions(
        &self,
        drum_id: Option<&DrumId>,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let state = self.read()?;
        Ok(state
            .transactions
            .iter()
            .filter(|t| drum_id.is_none_or(|id| &t.drum_id == id))
            .cloned()
            .collect())
    }

    async fn snapshot(&self) -> Result<InventorySnapshot, StoreError> {
        let state = self.read()?;
        Ok(InventorySnapshot {
            revision: state.revision,
            drums: state.drums.values().cloned().collect(),
            grids: state.grids.values().cloned().collect(),
        })
    }

    async fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.revision)
    }
}
