use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    response::IntoResponse,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_history(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.list_history().await {
        Ok(history) => Json(history).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TransactionsQuery>,
) -> axum::response::Response {
    match services
        .queries
        .list_transactions(query.drum_id.as_deref())
        .await
    {
        Ok(log) => Json(log).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
