use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod drums;
pub mod grids;
pub mod ledger;
pub mod system;

/// Router for every inventory endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/drums", drums::router())
        .nest("/grids", grids::router())
        .route("/history", get(ledger::list_history))
        .route("/transactions", get(ledger::list_transactions))
        .route("/snapshot", get(system::snapshot))
        .route("/audit", get(system::audit))
        .route("/admin/reset", post(admin::reset))
}
