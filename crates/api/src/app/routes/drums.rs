use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_drums).post(register_drum))
        .route("/:id", get(get_drum))
        .route("/:id/place", post(place_drum))
        .route("/:id/retrieve", post(retrieve_drum))
}

pub async fn register_drum(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterDrumRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services
        .engine
        .register_or_update_drum(&body.drum_id, &body.order_ref, &body.material_ref)
        .await
    {
        Ok(drum) => Json(drum).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn place_drum(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::PlaceDrumRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.engine.place_drum(&id, &body.grid_id).await {
        Ok(placement) => Json(placement.transaction).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn retrieve_drum(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.engine.retrieve_drum(&id).await {
        Ok(retrieval) => Json(retrieval.history).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_drums(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DrumsQuery>,
) -> axum::response::Response {
    let drums = match query.order_ref.as_deref() {
        Some(order_ref) => services.queries.find_drums_by_order(order_ref).await,
        None => services.queries.list_drums().await,
    };
    match drums {
        Ok(drums) => Json(drums).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_drum(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.queries.get_drum(&id).await {
        Ok(drum) => Json(drum).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
