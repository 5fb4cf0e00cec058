// Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

// Declare submodules for different route groups
mod api;
mod static_pages;

// create_router accepts the AppState; the state is provided here so the
// result can be consumed directly in main.rs.
pub fn create_router(app_state: AppState) -> Router {
    // Selection events are POSTs against the coordinator; every mutating
    // route replies with the post-mutation snapshot.
    let api_router = Router::new()
        .route("/vehicle-type", post(api::set_vehicle_type))
        .route("/brand", post(api::select_brand))
        .route("/model", post(api::select_model))
        .route("/year", post(api::select_year))
        .route("/search", post(api::set_search_term))
        .route("/lookup", post(api::request_price_lookup))
        .route("/state", get(api::get_state))
        .with_state(app_state.clone());

    Router::new()
        // The application page (doesn't need the AppState)
        .route("/", get(static_pages::app_page))
        // Nest the API router which already has state
        .nest("/api", api_router)
        .with_state(app_state)
}
