//! Inkwell Core
//!
//! Host-system library for the Inkwell CMS: installed-plugin inventory,
//! capability model, API token storage, and path conventions.

pub mod capabilities;
pub mod paths;
pub mod plugins;
pub mod tokens;
