// The selection cascade coordinator: sequences the four dependent FIPE
// lookups (brand -> model -> year -> price), invalidates downstream state on
// upstream changes, and launches the two enrichment calls after a successful
// price lookup without blocking the caller.
//
// All state lives behind a single RwLock; locks are never held across an
// await. Every mutation that invalidates downstream state bumps a generation
// counter, and a fetch completion whose captured generation no longer matches
// is discarded instead of overwriting newer state.

use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::fipe_api::VehiclePricing;
use crate::gemini::VehicleEnrichment;
use crate::models::{CatalogEntry, ListingSource, PhaseStatus, VehicleDetails, VehicleType};

// User-facing messages, kept in the product language.
const MSG_BRANDS_FAILED: &str = "Não foi possível carregar as marcas.";
const MSG_MODELS_FAILED: &str = "Não foi possível carregar os modelos.";
const MSG_YEARS_FAILED: &str = "Não foi possível carregar os anos.";
const MSG_DETAILS_FAILED: &str = "Não foi possível obter os detalhes do veículo.";

const MSG_LOADING_BRANDS: &str = "Carregando marcas...";
const MSG_LOADING_MODELS: &str = "Carregando modelos...";
const MSG_LOADING_YEARS: &str = "Carregando anos...";
const MSG_LOADING_DETAILS: &str = "Consultando valor FIPE...";

#[derive(Debug)]
struct CascadeState {
    vehicle_type: VehicleType,
    brands: Vec<CatalogEntry>,
    models: Vec<CatalogEntry>,
    years: Vec<CatalogEntry>,
    selected_brand_code: String,
    selected_model_code: String,
    selected_year_code: String,
    brand_search_term: String,
    model_search_term: String,
    year_search_term: String,
    status: PhaseStatus,
    loading_message: String,
    error_message: Option<String>,
    details: Option<VehicleDetails>,
    image_url: Option<String>,
    listings: Vec<ListingSource>,
    listings_status: PhaseStatus,
    // Bumped on every downstream invalidation; stale completions are dropped.
    generation: u64,
}

impl Default for CascadeState {
    fn default() -> Self {
        Self {
            vehicle_type: VehicleType::Cars,
            brands: Vec::new(),
            models: Vec::new(),
            years: Vec::new(),
            selected_brand_code: String::new(),
            selected_model_code: String::new(),
            selected_year_code: String::new(),
            brand_search_term: String::new(),
            model_search_term: String::new(),
            year_search_term: String::new(),
            status: PhaseStatus::Idle,
            loading_message: String::new(),
            error_message: None,
            details: None,
            image_url: None,
            listings: Vec::new(),
            listings_status: PhaseStatus::Idle,
            generation: 0,
        }
    }
}

impl CascadeState {
    // Clears the requested selection levels plus everything derived from a
    // resolved chain (price record, image, listings). Invariant: clearing a
    // level always clears every level below it.
    fn reset_selections(&mut self, brand: bool, model: bool, year: bool) {
        if brand {
            self.selected_brand_code.clear();
            self.brand_search_term.clear();
        }
        if model {
            self.selected_model_code.clear();
            self.models.clear();
            self.model_search_term.clear();
        }
        if year {
            self.selected_year_code.clear();
            self.years.clear();
            self.year_search_term.clear();
        }

        self.details = None;
        self.image_url = None;
        self.status = PhaseStatus::Idle;
        self.listings.clear();
        self.listings_status = PhaseStatus::Idle;
        self.generation += 1;
    }

    fn begin_fetch(&mut self, loading_message: &str) -> u64 {
        self.status = PhaseStatus::Loading;
        self.loading_message = loading_message.to_string();
        self.error_message = None;
        self.generation
    }

    fn fail(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
        self.status = PhaseStatus::Error;
    }

    fn form_complete(&self) -> bool {
        !self.selected_brand_code.is_empty()
            && !self.selected_model_code.is_empty()
            && !self.selected_year_code.is_empty()
    }
}

// Serializable view of the coordinator, with the catalogs already filtered
// by their search terms and the derived form-complete flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSnapshot {
    pub vehicle_type: VehicleType,
    pub brands: Vec<CatalogEntry>,
    pub models: Vec<CatalogEntry>,
    pub years: Vec<CatalogEntry>,
    pub selected_brand_code: String,
    pub selected_model_code: String,
    pub selected_year_code: String,
    pub brand_search_term: String,
    pub model_search_term: String,
    pub year_search_term: String,
    pub status: PhaseStatus,
    pub loading_message: String,
    pub error_message: Option<String>,
    pub form_complete: bool,
    pub details: Option<VehicleDetails>,
    pub image_url: Option<String>,
    pub listings: Vec<ListingSource>,
    pub listings_status: PhaseStatus,
}

// Case-insensitive substring filter over display names. An empty term
// returns the full listing; the underlying list is never mutated.
fn filter_catalog(entries: &[CatalogEntry], term: &str) -> Vec<CatalogEntry> {
    if term.is_empty() {
        return entries.to_vec();
    }
    let term = term.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&term))
        .cloned()
        .collect()
}

pub struct CascadeCoordinator {
    pricing: Arc<dyn VehiclePricing>,
    enrichment: Arc<dyn VehicleEnrichment>,
    state: Arc<RwLock<CascadeState>>,
}

impl CascadeCoordinator {
    pub fn new(pricing: Arc<dyn VehiclePricing>, enrichment: Arc<dyn VehicleEnrichment>) -> Self {
        Self {
            pricing,
            enrichment,
            state: Arc::new(RwLock::new(CascadeState::default())),
        }
    }

    pub fn snapshot(&self) -> CascadeSnapshot {
        let state = self.state.read().unwrap();
        CascadeSnapshot {
            vehicle_type: state.vehicle_type,
            brands: filter_catalog(&state.brands, &state.brand_search_term),
            models: filter_catalog(&state.models, &state.model_search_term),
            years: filter_catalog(&state.years, &state.year_search_term),
            selected_brand_code: state.selected_brand_code.clone(),
            selected_model_code: state.selected_model_code.clone(),
            selected_year_code: state.selected_year_code.clone(),
            brand_search_term: state.brand_search_term.clone(),
            model_search_term: state.model_search_term.clone(),
            year_search_term: state.year_search_term.clone(),
            status: state.status,
            loading_message: state.loading_message.clone(),
            error_message: state.error_message.clone(),
            form_complete: state.form_complete(),
            details: state.details.clone(),
            image_url: state.image_url.clone(),
            listings: state.listings.clone(),
            listings_status: state.listings_status,
        }
    }

    // Switches the vehicle category. No-op when unchanged; otherwise the
    // whole cascade is invalidated and the brand listing is re-fetched.
    pub async fn set_vehicle_type(&self, vehicle_type: VehicleType) {
        {
            let mut state = self.state.write().unwrap();
            if state.vehicle_type == vehicle_type {
                return;
            }
            state.vehicle_type = vehicle_type;
            state.reset_selections(true, true, true);
        }
        self.load_brands().await;
    }

    pub async fn load_brands(&self) {
        let (vehicle_type, generation) = {
            let mut state = self.state.write().unwrap();
            state.brands.clear();
            let generation = state.begin_fetch(MSG_LOADING_BRANDS);
            (state.vehicle_type, generation)
        };

        let result = self.pricing.brands(vehicle_type).await;

        let mut state = self.state.write().unwrap();
        if state.generation != generation {
            tracing::debug!(generation, "Discarding stale brand listing");
            return;
        }
        match result {
            Ok(brands) => {
                tracing::info!(count = brands.len(), %vehicle_type, "Loaded brand listing");
                state.brands = brands;
                state.status = PhaseStatus::Idle;
            }
            Err(e) => {
                tracing::error!("Failed to load brands: {:?}", e);
                state.fail(MSG_BRANDS_FAILED);
            }
        }
    }

    // Selects a brand: records the code, mirrors the name into the search
    // term, clears model/year and fetches the model listing.
    pub async fn select_brand(&self, brand: CatalogEntry) {
        let (vehicle_type, generation) = {
            let mut state = self.state.write().unwrap();
            state.selected_brand_code = brand.code.clone();
            state.brand_search_term = brand.name.clone();
            state.reset_selections(false, true, true);
            let generation = state.begin_fetch(MSG_LOADING_MODELS);
            (state.vehicle_type, generation)
        };

        let result = self.pricing.models(vehicle_type, &brand.code).await;

        let mut state = self.state.write().unwrap();
        if state.generation != generation {
            tracing::debug!(generation, brand = %brand.name, "Discarding stale model listing");
            return;
        }
        match result {
            Ok(models) => {
                tracing::info!(count = models.len(), brand = %brand.name, "Loaded model listing");
                state.models = models;
                state.status = PhaseStatus::Idle;
            }
            Err(e) => {
                tracing::error!("Failed to load models: {:?}", e);
                state.fail(MSG_MODELS_FAILED);
            }
        }
    }

    // Selects a model: clears year and fetches the year listing.
    pub async fn select_model(&self, model: CatalogEntry) {
        let (vehicle_type, brand_code, generation) = {
            let mut state = self.state.write().unwrap();
            if state.selected_brand_code.is_empty() {
                return;
            }
            state.selected_model_code = model.code.clone();
            state.model_search_term = model.name.clone();
            state.reset_selections(false, false, true);
            let generation = state.begin_fetch(MSG_LOADING_YEARS);
            (state.vehicle_type, state.selected_brand_code.clone(), generation)
        };

        let result = self.pricing.years(vehicle_type, &brand_code, &model.code).await;

        let mut state = self.state.write().unwrap();
        if state.generation != generation {
            tracing::debug!(generation, model = %model.name, "Discarding stale year listing");
            return;
        }
        match result {
            Ok(years) => {
                tracing::info!(count = years.len(), model = %model.name, "Loaded year listing");
                state.years = years;
                state.status = PhaseStatus::Idle;
            }
            Err(e) => {
                tracing::error!("Failed to load years: {:?}", e);
                state.fail(MSG_YEARS_FAILED);
            }
        }
    }

    // Selects a year. Deliberately fetches nothing: the price lookup is a
    // separate, explicit action.
    pub fn select_year(&self, year: CatalogEntry) {
        let mut state = self.state.write().unwrap();
        state.selected_year_code = year.code;
        state.year_search_term = year.name;
    }

    // Search-term updates. Typing over an already-made selection clears it
    // and everything downstream of it.
    pub fn set_brand_search(&self, term: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.brand_search_term = term.into();
        if !state.selected_brand_code.is_empty() {
            state.selected_brand_code.clear();
            state.reset_selections(false, true, true);
        }
    }

    pub fn set_model_search(&self, term: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.model_search_term = term.into();
        if !state.selected_model_code.is_empty() {
            state.selected_model_code.clear();
            state.reset_selections(false, false, true);
        }
    }

    pub fn set_year_search(&self, term: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.year_search_term = term.into();
        if !state.selected_year_code.is_empty() {
            state.selected_year_code.clear();
        }
    }

    // Fetches the price record for the resolved chain. Guarded: does nothing
    // at all while the form is incomplete. On success the two enrichment
    // calls are launched in the background and the method returns without
    // awaiting them.
    pub async fn request_price_lookup(&self) {
        let (vehicle_type, brand_code, model_code, year_code, generation) = {
            let mut state = self.state.write().unwrap();
            if !state.form_complete() {
                return;
            }
            state.details = None;
            state.image_url = None;
            state.listings.clear();
            state.listings_status = PhaseStatus::Idle;
            state.generation += 1;
            let generation = state.begin_fetch(MSG_LOADING_DETAILS);
            (
                state.vehicle_type,
                state.selected_brand_code.clone(),
                state.selected_model_code.clone(),
                state.selected_year_code.clone(),
                generation,
            )
        };

        let result = self
            .pricing
            .details(vehicle_type, &brand_code, &model_code, &year_code)
            .await;

        let details = {
            let mut state = self.state.write().unwrap();
            if state.generation != generation {
                tracing::debug!(generation, "Discarding stale price record");
                return;
            }
            match result {
                Ok(details) => {
                    tracing::info!(
                        brand = %details.brand,
                        model = %details.model,
                        year = details.model_year,
                        "Price lookup succeeded"
                    );
                    state.details = Some(details.clone());
                    state.status = PhaseStatus::Success;
                    details
                }
                Err(e) => {
                    tracing::error!("Price lookup failed: {:?}", e);
                    state.fail(MSG_DETAILS_FAILED);
                    return;
                }
            }
        };

        // Non-blocking enrichment. Both calls run concurrently; each writes
        // its own result exactly once and their outcomes are independent.
        let enrichment = Arc::clone(&self.enrichment);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let image = image_task(enrichment.as_ref(), &state, &details, generation);
            let listings = listings_task(enrichment.as_ref(), &state, &details, generation);
            futures::future::join(image, listings).await;
        });
    }
}

// Stores the generated image, or leaves it absent on failure. An image
// failure is logged and suppressed; it never reaches the user.
async fn image_task(
    enrichment: &dyn VehicleEnrichment,
    state: &RwLock<CascadeState>,
    vehicle: &VehicleDetails,
    generation: u64,
) {
    match enrichment.generate_vehicle_image(vehicle).await {
        Ok(image) => {
            let mut state = state.write().unwrap();
            if state.generation != generation {
                tracing::debug!(generation, "Discarding stale generated image");
                return;
            }
            state.image_url = image;
        }
        Err(e) => {
            tracing::warn!("Image generation failed: {:?}", e);
        }
    }
}

// Runs the grounded listing search with its own status lifecycle. An empty
// result is a success with zero listings, not an error.
async fn listings_task(
    enrichment: &dyn VehicleEnrichment,
    state: &RwLock<CascadeState>,
    vehicle: &VehicleDetails,
    generation: u64,
) {
    {
        let mut state = state.write().unwrap();
        if state.generation != generation {
            return;
        }
        state.listings_status = PhaseStatus::Loading;
        state.listings.clear();
    }

    let result = enrichment.search_vehicle_listings(vehicle).await;

    let mut state = state.write().unwrap();
    if state.generation != generation {
        tracing::debug!(generation, "Discarding stale listing search");
        return;
    }
    match result {
        Ok(listings) => {
            tracing::info!(count = listings.len(), "Listing search succeeded");
            state.listings = listings;
            state.listings_status = PhaseStatus::Success;
        }
        Err(e) => {
            tracing::error!("Listing search failed: {:?}", e);
            state.listings_status = PhaseStatus::Error;
        }
    }
}
