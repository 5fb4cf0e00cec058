// Data structures shared by the FIPE client, the Gemini client and the
// selection cascade coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

// Top-level vehicle category; root of the selection cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Cars,
    Motorcycles,
}

impl VehicleType {
    // Path segment used by the FIPE v2 API.
    pub fn as_path(&self) -> &'static str {
        match self {
            VehicleType::Cars => "cars",
            VehicleType::Motorcycles => "motorcycles",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

// One entry of a brand/model/year listing. Codes are opaque strings issued
// by the FIPE API and are never constructed locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub code: String,
}

// Price record for a fully-resolved selection chain. Field names match the
// FIPE v2 JSON response; the record is replaced wholesale on each lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub price: String,
    pub brand: String,
    pub model: String,
    pub model_year: i32,
    pub fuel: String,
    pub fipe_code: String,
    pub reference_month: String,
}

// A grounded-search citation. The URI is always present; titles are
// best-effort from the grounding metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSource {
    pub uri: String,
    pub title: Option<String>,
}

// Lifecycle of one logical operation (cascade/price lookup, listings search).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Idle,
    Loading,
    Success,
    Error,
}
