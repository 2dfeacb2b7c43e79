use std::sync::Arc;

use anyhow::Context;

use drumyard_api::{BIND_ADDR, DEFAULT_BIND_ADDR, app};
use drumyard_infra::InventoryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    drumyard_observability::init();

    let config = InventoryConfig::from_env().context("invalid inventory configuration")?;
    let services = app::services::AppServices::from_config(&config)
        .await
        .context("failed to open inventory store")?;

    let app = app::build_app(Arc::new(services));

    let addr = std::env::var(BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
