//! Installed plugin endpoints
//!
//! Read access requires the `manage_options` capability; deletion requires
//! the stronger `delete_plugins`. Plugins are addressed by the slug
//! derived from their declared name, recomputed on every lookup.

use std::sync::OnceLock;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use inkwell_core::capabilities::{DELETE_PLUGINS, MANAGE_OPTIONS};
use inkwell_core::plugins::{PluginRecord, UninstallError};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::AppState;

/// Build the plugins router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plugins))
        .route("/schema", get(item_schema))
        .route("/:slug", get(get_plugin).delete(delete_plugin))
}

/// Public representation of an installed plugin
#[derive(Debug, Clone, Serialize)]
pub struct PluginResponse {
    pub slug: String,
    pub name: String,
    pub plugin_uri: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub author_uri: String,
    pub text_domain: String,
    pub domain_path: String,
    pub network: String,
    pub title: String,
    pub author_name: String,
}

impl PluginResponse {
    /// Map an inventory record into its public representation.
    ///
    /// Metadata is carried verbatim; the record's install path stays
    /// host-internal.
    fn from_record(record: &PluginRecord) -> Self {
        let manifest = &record.manifest;
        Self {
            slug: record.slug(),
            name: manifest.name.clone(),
            plugin_uri: manifest.plugin_uri.clone(),
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            author: manifest.author.clone(),
            author_uri: manifest.author_uri.clone(),
            text_domain: manifest.text_domain.clone(),
            domain_path: manifest.domain_path.clone(),
            network: manifest.network.clone(),
            title: manifest.title.clone(),
            author_name: manifest.author_name.clone(),
        }
    }
}

/// Result of deleting a plugin
#[derive(Debug, Serialize)]
pub struct DeletePluginResponse {
    pub deleted: bool,
    pub previous: PluginResponse,
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("slug pattern should compile"))
}

/// Reject route slugs that are not plain URL-safe tokens.
fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug_pattern().is_match(slug) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid plugin slug: {}", slug)))
    }
}

/// Fail with 401/403 unless the caller holds `capability`.
fn require_capability(user: &CurrentUser, capability: &str, denied: &str) -> Result<(), AppError> {
    if user.0.can(capability) {
        return Ok(());
    }
    if user.0.authenticated {
        Err(AppError::Forbidden(denied.to_string()))
    } else {
        Err(AppError::Unauthorized(denied.to_string()))
    }
}

fn plugin_not_found(slug: &str) -> AppError {
    AppError::NotFound(format!("Plugin with slug {} not found.", slug))
}

/// List all installed plugins
async fn list_plugins(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<PluginResponse>>, AppError> {
    require_capability(&user, MANAGE_OPTIONS, "Sorry, you cannot view the list of plugins")?;

    let records = state.inventory.enumerate().await?;
    Ok(Json(records.iter().map(PluginResponse::from_record).collect()))
}

/// Fetch a single plugin by slug
async fn get_plugin(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: CurrentUser,
) -> Result<Json<PluginResponse>, AppError> {
    validate_slug(&slug)?;
    require_capability(&user, MANAGE_OPTIONS, "Sorry, you do not have access to this resource")?;

    let record = state
        .inventory
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| plugin_not_found(&slug))?;

    let mut response = PluginResponse::from_record(&record);
    response.slug = slug;
    Ok(Json(response))
}

/// Delete a plugin's files
async fn delete_plugin(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: CurrentUser,
) -> Result<Json<DeletePluginResponse>, AppError> {
    validate_slug(&slug)?;
    require_capability(&user, DELETE_PLUGINS, "Sorry, you cannot delete plugins")?;

    let record = state
        .inventory
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| plugin_not_found(&slug))?;

    match state.inventory.remove(&record).await {
        Ok(()) => {}
        // A concurrent delete already removed the files.
        Err(UninstallError::Missing { .. }) => return Err(plugin_not_found(&slug)),
        Err(err) => return Err(err.into()),
    }

    let mut previous = PluginResponse::from_record(&record);
    previous.slug = slug;
    Ok(Json(DeletePluginResponse {
        deleted: true,
        previous,
    }))
}

/// Machine-readable schema for the plugin object (JSON Schema draft-04)
async fn item_schema() -> Json<Value> {
    Json(json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "title": "plugin",
        "type": "object",
        "properties": {
            "slug": {
                "description": "URL-safe identifier derived from the plugin name",
                "type": "string"
            },
            "name": {
                "description": "Declared name of the plugin",
                "type": "string"
            },
            "plugin_uri": {
                "description": "Homepage of the plugin",
                "type": "string"
            },
            "version": {
                "description": "Declared version of the plugin",
                "type": "string"
            },
            "description": {
                "description": "Declared description of the plugin",
                "type": "string"
            },
            "author": {
                "description": "Declared author of the plugin",
                "type": "string"
            },
            "author_uri": {
                "description": "Homepage of the plugin author",
                "type": "string"
            },
            "text_domain": {
                "description": "Translation text domain of the plugin",
                "type": "string"
            },
            "domain_path": {
                "description": "Path to the plugin's translation files",
                "type": "string"
            },
            "network": {
                "description": "Whether the plugin applies network-wide",
                "type": "string"
            },
            "title": {
                "description": "Display title of the plugin",
                "type": "string"
            },
            "author_name": {
                "description": "Display name of the plugin author",
                "type": "string"
            }
        }
    }))
}
