//! Inkwell Server
//!
//! Self-hosted API server for the Inkwell plugins resource.
//! This is a library crate — the server is started via `start_server()`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{http::Method, middleware, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use inkwell_core::paths;
use inkwell_core::plugins::PluginInventory;
use inkwell_core::tokens::ApiTokenStore;

pub mod auth;
pub mod error;
pub mod routes;

/// Configuration for starting the server.
pub struct ServerConfig {
    /// Port to listen on (default: 3000).
    pub port: u16,
    /// Directory holding installed plugin packages.
    pub plugins_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            plugins_dir: paths::plugins_dir(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Inventory of installed plugin packages, re-read per request.
    pub inventory: Arc<PluginInventory>,
    /// API token store resolving bearer tokens to capabilities.
    pub token_store: Arc<RwLock<ApiTokenStore>>,
}

/// Build the axum router with all routes.
pub fn build_router(config: &ServerConfig) -> (Router, AppState) {
    let token_store = match ApiTokenStore::load() {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Failed to load API tokens: {}; treating all callers as anonymous", e);
            ApiTokenStore::default()
        }
    };
    if token_store.is_empty() {
        tracing::warn!("No API tokens configured; plugin endpoints will refuse every caller");
    }

    let state = AppState {
        inventory: Arc::new(PluginInventory::new(config.plugins_dir.clone())),
        token_store: Arc::new(RwLock::new(token_store)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            routes::api_router().layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_middleware,
            )),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

/// Start the Inkwell server and block until shutdown.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let (app, _state) = build_router(&config);

    tracing::info!("Inkwell server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: HashMap::from([("plugins".to_string(), true)]),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    features: HashMap<String, bool>,
}
