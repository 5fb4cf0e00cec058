// Configuration loading via the 'config' crate and 'dotenv'.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_FIPE_BASE_URL: &str = "https://fipe.parallelum.com.br/api/v2";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_address: String,
    pub fipe_base_url: String,
    // Credential for the Generative Language API. There is deliberately no
    // UI to collect this; absence is fatal at startup.
    pub gemini_api_key: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            // Add default values
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("fipe_base_url", DEFAULT_FIPE_BASE_URL)?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_GEMINI_API_KEY)
            .add_source(Environment::with_prefix("APP"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        // Deployments usually provision the key as a bare environment
        // variable, so honour that spelling too.
        if settings.gemini_api_key.is_none() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                if !key.is_empty() {
                    settings.gemini_api_key = Some(key);
                }
            }
        }

        Ok(settings)
    }
}
