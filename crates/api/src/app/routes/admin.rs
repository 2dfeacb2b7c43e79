use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;

/// Wipe drums, transactions and history; every grid comes back Available.
pub async fn reset(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.engine.reset_all().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
