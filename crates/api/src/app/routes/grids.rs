use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_grids))
}

/// `?available=true` narrows the listing to free slots.
pub async fn list_grids(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::GridsQuery>,
) -> axum::response::Response {
    let grids = if query.available {
        services.queries.list_available_grids().await
    } else {
        services.queries.list_grids().await
    };
    match grids {
        Ok(grids) => Json(grids).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
