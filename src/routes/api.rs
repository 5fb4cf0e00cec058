// Handlers for the JSON API consumed by the application page. Each selection
// event is forwarded to the cascade coordinator and answered with the
// resulting state snapshot, so the page re-renders without a second request.

use axum::{
    extract::{Json as JsonExtract, State},
    response::Json,
};
use serde::Deserialize;

use crate::AppState;
use crate::coordinator::CascadeSnapshot;
use crate::models::{CatalogEntry, VehicleType};

// --- Request Structs ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTypeRequest {
    vehicle_type: VehicleType,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Brand,
    Model,
    Year,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    field: SearchField,
    term: String,
}

// --- API Handlers ---

pub async fn get_state(State(app_state): State<AppState>) -> Json<CascadeSnapshot> {
    Json(app_state.coordinator.snapshot())
}

pub async fn set_vehicle_type(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<VehicleTypeRequest>,
) -> Json<CascadeSnapshot> {
    tracing::info!("API call: set_vehicle_type to {}", request.vehicle_type);
    app_state.coordinator.set_vehicle_type(request.vehicle_type).await;
    Json(app_state.coordinator.snapshot())
}

pub async fn select_brand(
    State(app_state): State<AppState>,
    JsonExtract(brand): JsonExtract<CatalogEntry>,
) -> Json<CascadeSnapshot> {
    tracing::info!("API call: select_brand {} ({})", brand.name, brand.code);
    app_state.coordinator.select_brand(brand).await;
    Json(app_state.coordinator.snapshot())
}

pub async fn select_model(
    State(app_state): State<AppState>,
    JsonExtract(model): JsonExtract<CatalogEntry>,
) -> Json<CascadeSnapshot> {
    tracing::info!("API call: select_model {} ({})", model.name, model.code);
    app_state.coordinator.select_model(model).await;
    Json(app_state.coordinator.snapshot())
}

pub async fn select_year(
    State(app_state): State<AppState>,
    JsonExtract(year): JsonExtract<CatalogEntry>,
) -> Json<CascadeSnapshot> {
    tracing::info!("API call: select_year {} ({})", year.name, year.code);
    app_state.coordinator.select_year(year);
    Json(app_state.coordinator.snapshot())
}

pub async fn set_search_term(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<SearchRequest>,
) -> Json<CascadeSnapshot> {
    match request.field {
        SearchField::Brand => app_state.coordinator.set_brand_search(request.term),
        SearchField::Model => app_state.coordinator.set_model_search(request.term),
        SearchField::Year => app_state.coordinator.set_year_search(request.term),
    }
    Json(app_state.coordinator.snapshot())
}

pub async fn request_price_lookup(State(app_state): State<AppState>) -> Json<CascadeSnapshot> {
    tracing::info!("API call: request_price_lookup");
    app_state.coordinator.request_price_lookup().await;
    Json(app_state.coordinator.snapshot())
}
