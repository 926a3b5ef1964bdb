//! API token storage
//!
//! Maps bearer tokens to their granted capabilities in a JSON file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::capabilities::CapabilitySet;
use crate::paths;

/// Storage for API tokens indexed by token value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTokenStore {
    /// Granted capabilities by token value
    #[serde(flatten)]
    tokens: HashMap<String, CapabilitySet>,
}

impl ApiTokenStore {
    /// Get the token file path
    fn path() -> PathBuf {
        paths::api_tokens_path()
    }

    /// Load tokens from disk
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load tokens from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let store: ApiTokenStore = serde_json::from_str(&contents)?;
        Ok(store)
    }

    /// Save tokens to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Save tokens to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = fs::metadata(path) {
                let mut permissions = metadata.permissions();
                permissions.set_mode(0o600);
                let _ = fs::set_permissions(path, permissions);
            }
        }
        Ok(())
    }

    /// Capabilities granted to a token, if it is known
    pub fn capabilities(&self, token: &str) -> Option<&CapabilitySet> {
        self.tokens.get(token)
    }

    /// Register a token with its capabilities
    pub fn insert(&mut self, token: impl Into<String>, capabilities: CapabilitySet) {
        self.tokens.insert(token.into(), capabilities);
    }

    /// Remove a token
    pub fn remove(&mut self, token: &str) {
        self.tokens.remove(token);
    }

    /// Whether any tokens are configured
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MANAGE_OPTIONS;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("tokens").join("api_tokens.json");

        let mut store = ApiTokenStore::default();
        store.insert("secret-token", [MANAGE_OPTIONS].into_iter().collect());
        store.save_to_path(&path).expect("save");

        let loaded = ApiTokenStore::load_from_path(&path).expect("load");
        let caps = loaded.capabilities("secret-token").expect("token present");
        assert!(caps.grants(MANAGE_OPTIONS));
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let temp = tempdir().expect("tempdir");
        let store =
            ApiTokenStore::load_from_path(&temp.path().join("absent.json")).expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_token_has_no_capabilities() {
        let store = ApiTokenStore::default();
        assert!(store.capabilities("nope").is_none());
    }
}
