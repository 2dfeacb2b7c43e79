//! Infrastructure layer: durable store, inventory engine, read projections, config.

pub mod config;
pub mod engine;
pub mod error;
pub mod queries;
pub mod retry;
pub mod store;


pub use config::{ConfigError, InventoryConfig};
pub use engine::InventoryEngine;
pub use error::{InventoryError, StoreError};
pub use queries::InventoryQueries;
pub use retry::RetryPolicy;
pub use store::{
    CommittedPlacement, CommittedRetrieval, DrumFilter, GridFilter, InMemoryInventoryStore,
    InventoryStore, SqliteInventoryStore,
};
