use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterDrumRequest {
    pub drum_id: String,
    #[serde(default)]
    pub order_ref: String,
    #[serde(default)]
    pub material_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDrumRequest {
    pub grid_id: String,
}

// -------------------------
// Query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DrumsQuery {
    pub order_ref: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GridsQuery {
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    pub drum_id: Option<String>,
}
