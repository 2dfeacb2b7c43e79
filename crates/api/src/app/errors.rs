use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use drumyard_infra::InventoryError;

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        InventoryError::DrumNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "drum_not_found", message)
        }
        InventoryError::GridUnavailable(_) => {
            json_error(StatusCode::CONFLICT, "grid_unavailable", message)
        }
        InventoryError::DrumNotPlaced(_) => {
            json_error(StatusCode::CONFLICT, "drum_not_placed", message)
        }
        InventoryError::DrumAlreadyPlaced(_) => {
            json_error(StatusCode::CONFLICT, "drum_already_placed", message)
        }
        InventoryError::InvalidInput(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_input", message)
        }
        InventoryError::InvariantViolation(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invariant_violation",
            message,
        ),
        InventoryError::StoreUnavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
        }
    }
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_input", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
