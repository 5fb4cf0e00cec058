// Functions to interact with the FIPE v2 API (brands, models, years, price).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::models::{CatalogEntry, VehicleDetails, VehicleType};

// Read-only pricing lookups consumed by the coordinator. Kept behind a
// trait so tests can substitute a stub backend for the live API.
#[async_trait]
pub trait VehiclePricing: Send + Sync {
    async fn brands(&self, vehicle_type: VehicleType) -> Result<Vec<CatalogEntry>>;

    async fn models(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
    ) -> Result<Vec<CatalogEntry>>;

    async fn years(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
        model_code: &str,
    ) -> Result<Vec<CatalogEntry>>;

    async fn details(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
        model_code: &str,
        year_code: &str,
    ) -> Result<VehicleDetails>;
}

// Stateless client over the public FIPE v2 endpoints. No caching, no
// retries; every call is a plain GET returning JSON.
pub struct FipeClient {
    http: Arc<Client>,
    base_url: String,
}

impl FipeClient {
    pub fn new(http: Arc<Client>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    async fn get_catalog(&self, url: String) -> Result<Vec<CatalogEntry>> {
        tracing::debug!(url, "Fetching FIPE catalog listing");
        let entries = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()? // Check for HTTP errors
            .json::<Vec<CatalogEntry>>()
            .await
            .with_context(|| format!("Failed to parse FIPE listing from {}", url))?;
        Ok(entries)
    }
}

#[async_trait]
impl VehiclePricing for FipeClient {
    async fn brands(&self, vehicle_type: VehicleType) -> Result<Vec<CatalogEntry>> {
        let url = format!("{}/{}/brands", self.base_url, vehicle_type.as_path());
        self.get_catalog(url).await
    }

    async fn models(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
    ) -> Result<Vec<CatalogEntry>> {
        let url = format!(
            "{}/{}/brands/{}/models",
            self.base_url,
            vehicle_type.as_path(),
            brand_code
        );
        self.get_catalog(url).await
    }

    async fn years(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
        model_code: &str,
    ) -> Result<Vec<CatalogEntry>> {
        let url = format!(
            "{}/{}/brands/{}/models/{}/years",
            self.base_url,
            vehicle_type.as_path(),
            brand_code,
            model_code
        );
        self.get_catalog(url).await
    }

    async fn details(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
        model_code: &str,
        year_code: &str,
    ) -> Result<VehicleDetails> {
        let url = format!(
            "{}/{}/brands/{}/models/{}/years/{}",
            self.base_url,
            vehicle_type.as_path(),
            brand_code,
            model_code,
            year_code
        );
        tracing::debug!(url, "Fetching FIPE price record");
        let details = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<VehicleDetails>()
            .await
            .with_context(|| format!("Failed to parse FIPE price record from {}", url))?;
        Ok(details)
    }
}
