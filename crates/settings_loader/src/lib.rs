//! # Settings Loader
//!
//! Loads [`ParserSettings`] for the statement parsers from a JSON file, usually
//! `parser_settings.json` next to the statements being imported.
//!
//! ## Features
//!
//! - Load settings from specified file paths
//! - Load settings from default location (`parser_settings.json`)
//! - Handle optional settings gracefully
//! - Fall back to the built-in MetaTrader 4 defaults when no file exists
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/mt5.json")?;
//!
//! // Load optional settings (returns None if no path is given)
//! let path = Some(PathBuf::from("parser_settings.json"));
//! let settings = settings_loader::load_optional_settings(path.as_ref())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use models::ParserSettings;
use tracing::{debug, warn};

pub const DEFAULT_SETTINGS_FILE: &str = "parser_settings.json";

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ParserSettings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: ParserSettings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    debug!(path = %path.display(), "Loaded parser settings");
    Ok(settings)
}

/// Loads settings from the default location (parser_settings.json in the current directory)
pub fn load_default_settings() -> Result<ParserSettings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<ParserSettings>> {
    match path {
        Some(settings_path) => Ok(Some(load_settings(settings_path)?)),
        None => Ok(None),
    }
}

/// Tries the provided path, then the default location, then the built-in defaults.
///
/// An explicitly provided file that exists but does not parse is an error; a
/// missing file is not.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<ParserSettings> {
    if let Some(settings_path) = path {
        if settings_file_exists(settings_path) {
            return load_settings(settings_path);
        }
        warn!(path = %settings_path.display(), "Settings file not found, trying default location");
    }

    if default_settings_exist() {
        return load_default_settings();
    }

    Ok(ParserSettings::default())
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

/// Checks if the default settings file exists
pub fn default_settings_exist() -> bool {
    settings_file_exists(DEFAULT_SETTINGS_FILE)
}
