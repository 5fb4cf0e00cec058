use anyhow::{Context, Result};
use axum::{Router, extract::FromRef};
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::coordinator::CascadeCoordinator;
use crate::fipe_api::FipeClient;
use crate::gemini::GeminiClient;

// Declare modules
mod config;
mod coordinator;
mod error;
mod fipe_api;
mod gemini;
mod models;
mod routes;

// Define the application state struct
#[derive(Clone, FromRef)]
struct AppState {
    settings: Arc<config::Settings>,
    coordinator: Arc<CascadeCoordinator>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fipe_lookup_rust=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing FIPE lookup server...");

    // Load configuration
    let settings = match config::Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    let shared_settings = Arc::new(settings);

    // One shared reqwest client for both remote services
    let http_client = Arc::new(
        Client::builder()
            .user_agent(concat!("fipe_lookup_rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build shared reqwest client")?,
    );
    tracing::info!("Shared HTTP client created.");

    let fipe_client = Arc::new(FipeClient::new(
        Arc::clone(&http_client),
        shared_settings.fipe_base_url.clone(),
    ));

    // The enrichment client refuses to construct without a credential; that
    // is a startup failure, not something to degrade around.
    let gemini_client = match GeminiClient::new(
        Arc::clone(&http_client),
        shared_settings.gemini_api_key.clone(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to initialize enrichment client: {}", e);
            return Err(e.into());
        }
    };

    let coordinator = Arc::new(CascadeCoordinator::new(fipe_client, gemini_client));

    // Load the initial brand listing in the background; the server comes up
    // immediately and the page shows the loading state meanwhile.
    {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.load_brands().await });
    }

    let app_state = AppState {
        settings: Arc::clone(&shared_settings),
        coordinator,
    };

    let router: Router = routes::create_router(app_state.clone());

    // Combine the router with static file serving
    let app = router.nest_service("/static", ServeDir::new("static"));

    // Parse the server address from settings
    let addr: SocketAddr = match app_state.settings.server_address.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(
                "Invalid server address format in configuration ('{}'): {}",
                app_state.settings.server_address,
                e
            );
            return Err(anyhow::anyhow!(
                "Invalid server address format: {}",
                shared_settings.server_address
            ));
        }
    };

    // Create a TCP listener
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    // Run the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
