//! Capability model for API authorization
//!
//! Callers hold a set of named capability strings; each API operation is
//! gated on a single capability check against that set. Handlers consult
//! only the set handed to them, never ambient state, so tests can
//! substitute arbitrary grants.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Capability required to view installed plugins.
pub const MANAGE_OPTIONS: &str = "manage_options";

/// Capability required to delete installed plugins.
pub const DELETE_PLUGINS: &str = "delete_plugins";

/// A caller's granted capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(HashSet<String>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this set grants the named capability.
    pub fn grants(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    pub fn insert(&mut self, capability: impl Into<String>) {
        self.0.insert(capability.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
