// Client for the Google Generative Language API: vehicle image generation
// (Imagen) and grounded listing search (Gemini + Google Search tool).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::EnrichmentError;
use crate::models::{ListingSource, VehicleDetails};

const GENERATIVE_LANGUAGE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const SEARCH_MODEL: &str = "gemini-2.5-flash";

// Post-lookup enrichment calls. Both are independent of each other and of
// the price result; the coordinator treats each outcome separately.
#[async_trait]
pub trait VehicleEnrichment: Send + Sync {
    // Returns a data URL with the generated image, or None when the model
    // produced nothing.
    async fn generate_vehicle_image(&self, vehicle: &VehicleDetails) -> Result<Option<String>>;

    // Returns citation records for recent sale listings; may be empty.
    async fn search_vehicle_listings(&self, vehicle: &VehicleDetails)
    -> Result<Vec<ListingSource>>;
}

pub struct GeminiClient {
    http: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    // Fails when no API key is provisioned. There is no UI to collect the
    // key; a missing credential is a startup error, not a runtime state.
    pub fn new(http: Arc<Client>, api_key: Option<String>) -> Result<Self, EnrichmentError> {
        let api_key = match api_key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(EnrichmentError::MissingApiKey),
        };
        Ok(Self {
            http,
            api_key,
            base_url: GENERATIVE_LANGUAGE_BASE_URL.to_string(),
        })
    }

    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response
            .json()
            .await
            .context("Failed to parse Generative Language API response")?;
        Ok(body)
    }
}

#[async_trait]
impl VehicleEnrichment for GeminiClient {
    async fn generate_vehicle_image(&self, vehicle: &VehicleDetails) -> Result<Option<String>> {
        let prompt = format!(
            "Uma foto de estúdio, de alta qualidade e realista de um {} {} ano {}, cor prata. \
             Fundo neutro e limpo.",
            vehicle.brand, vehicle.model, vehicle.model_year
        );

        let url = format!("{}/models/{}:predict", self.base_url, IMAGE_MODEL);
        let payload = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "outputMimeType": "image/png",
                "aspectRatio": "16:9",
            },
        });

        tracing::debug!(model = IMAGE_MODEL, "Requesting vehicle image generation");
        let body = self.post_json(&url, &payload).await?;

        // The predict response carries the image as base64 bytes.
        let image = body
            .get("predictions")
            .and_then(|p| p.as_array())
            .and_then(|p| p.first())
            .and_then(|p| p.get("bytesBase64Encoded"))
            .and_then(|b| b.as_str())
            .map(|b64| format!("data:image/png;base64,{}", b64));

        Ok(image)
    }

    async fn search_vehicle_listings(
        &self,
        vehicle: &VehicleDetails,
    ) -> Result<Vec<ListingSource>> {
        let prompt = format!(
            "Encontre anúncios de venda recentes para um {} {} ano {} no Brasil. \
             Priorize sites como Webmotors, Mercado Livre e OLX.",
            vehicle.brand, vehicle.model, vehicle.model_year
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, SEARCH_MODEL);
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": [{ "google_search": {} }],
        });

        tracing::debug!(model = SEARCH_MODEL, "Requesting grounded listing search");
        let body = self.post_json(&url, &payload).await?;

        // Citations live in the grounding metadata of the first candidate.
        // A response without grounding chunks is an empty result, not an error.
        let chunks = body
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("groundingMetadata"))
            .and_then(|m| m.get("groundingChunks"))
            .and_then(|g| g.as_array());

        let listings = chunks
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(|chunk| {
                        let web = chunk.get("web")?;
                        let uri = web.get("uri")?.as_str()?.to_string();
                        let title = web
                            .get("title")
                            .and_then(|t| t.as_str())
                            .map(|t| t.to_string());
                        Some(ListingSource { uri, title })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(listings)
    }
}
