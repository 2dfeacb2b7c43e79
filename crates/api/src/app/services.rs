use std::sync::Arc;

use anyhow::Context;

use drumyard_infra::{
    InMemoryInventoryStore, InventoryConfig, InventoryEngine, InventoryError, InventoryQueries,
    InventoryStore, SqliteInventoryStore,
};
use drumyard_inventory::GridLayout;

/// Store handle shared by the engine and the query façade.
pub type SharedStore = dyn InventoryStore;

/// Everything the handlers need, injected once into the router.
pub struct AppServices {
    pub engine: InventoryEngine<SharedStore>,
    pub queries: InventoryQueries<SharedStore>,
}

impl AppServices {
    pub fn new(store: Arc<SharedStore>, layout: GridLayout) -> Self {
        let engine = InventoryEngine::new(store, layout);
        let queries = engine.queries();
        Self { engine, queries }
    }

    /// Open the SQLite store named by `config` and seed the grid layout.
    pub async fn from_config(config: &InventoryConfig) -> anyhow::Result<Self> {
        let store = SqliteInventoryStore::connect(config)
            .await
            .with_context(|| format!("failed to connect to {}", config.database_url))?;
        let services = Self::new(Arc::new(store), config.layout.clone());
        services
            .engine
            .initialize()
            .await
            .context("failed to initialize grid layout")?;
        Ok(services)
    }

    /// Non-durable services for tests and local experiments.
    pub async fn in_memory(layout: GridLayout) -> Result<Self, InventoryError> {
        let services = Self::new(Arc::new(InMemoryInventoryStore::new()), layout);
        services.engine.initialize().await?;
        Ok(services)
    }
}
