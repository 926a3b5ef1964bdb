use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Declared metadata of an installed plugin package (`plugin.toml`).
///
/// Every field is optional and defaults to an empty string; values are
/// surfaced verbatim, never normalized. A manifest that declares no name
/// does not identify a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PluginManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_uri: String,
    #[serde(default)]
    pub plugin_uri: String,
    #[serde(default)]
    pub text_domain: String,
    #[serde(default)]
    pub domain_path: String,
    #[serde(default)]
    pub network: String,
}

/// An installed plugin as enumerated from the inventory.
///
/// `install_path` locates the package manifest relative to the plugins
/// root. It is the inventory's internal identifier and never leaves the
/// host boundary; the public identifier is the slug derived from `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    pub install_path: PathBuf,
    pub manifest: PluginManifest,
}

impl PluginRecord {
    /// Derive the record's public slug from its declared name.
    ///
    /// Recomputed on every call; slugs are never stored, so a renamed
    /// package resolves differently on the next enumeration.
    pub fn slug(&self) -> String {
        super::slug::sanitize_slug(&self.manifest.name)
    }
}
