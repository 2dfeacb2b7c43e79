//! Durable drum/grid storage.
//!
//! The store owns atomicity: each mutating method runs one complete
//! transition (read current rows, ask the domain for the next state, write
//! it) as a single serializable unit, or changes nothing.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use r#trait::{CommittedPlacement, CommittedRetrieval, DrumFilter, GridFilter, InventoryStore};
pub use sqlite::SqliteInventoryStore;
