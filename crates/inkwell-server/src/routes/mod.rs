//! API routes

use axum::Router;

use crate::AppState;

mod plugins;

/// Build the API router with all endpoints
pub fn api_router() -> Router<AppState> {
    Router::new().nest("/plugins", plugins::router())
}
