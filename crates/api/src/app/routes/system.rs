use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// All drums and grids from one committed state.
pub async fn snapshot(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.queries.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

/// Cross-check drums against grids; always 200, breaches are reported in the body.
pub async fn audit(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.queries.audit().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
