//! Centralized path utilities
//!
//! All host filesystem locations in one place for consistency

use std::path::PathBuf;

const CONFIG_DIR_NAME: &str = ".inkwell";

/// Get the inkwell config directory (~/.inkwell)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the installed plugins directory (~/.inkwell/plugins)
pub fn plugins_dir() -> PathBuf {
    config_dir().join("plugins")
}

/// Get the tokens directory (~/.inkwell/tokens)
pub fn tokens_dir() -> PathBuf {
    config_dir().join("tokens")
}

/// Get the API tokens file (~/.inkwell/tokens/api_tokens.json)
pub fn api_tokens_path() -> PathBuf {
    tokens_dir().join("api_tokens.json")
}
