//! Inspection tool configuration
//!
//! Values resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; a malformed one is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "NAM_INSPECT_LOG_LEVEL";
/// Environment variable enabling strict decoding (`1`/`true`/`yes`)
pub const ENV_STRICT: &str = "NAM_INSPECT_STRICT";

const APP_DIR: &str = "nam-inspect";
const CONFIG_FILE: &str = "config.toml";

/// Settings for the inspection tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// tracing filter directive (e.g. `info`, `nam_metadata=debug`)
    pub log_level: String,
    /// Treat unrecognized record fields as violations
    pub strict: bool,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            strict: false,
            pretty: true,
        }
    }
}

/// Command-line overrides; `None` leaves lower-priority sources in effect
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub strict: Option<bool>,
    pub pretty: Option<bool>,
}

/// Default config file location (`<config_dir>/nam-inspect/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// Read a config file; a missing file yields `Ok(None)`
pub fn load_config_file(path: &Path) -> Result<Option<InspectConfig>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    toml::from_str(&text)
        .map(Some)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Write a config file atomically (temp file + rename)
pub fn write_config(config: &InspectConfig, path: &Path) -> Result<()> {
    let text = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, text)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl InspectConfig {
    /// Resolve configuration from all sources
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        // Priority 3/4: TOML file, else compiled defaults
        let path = overrides.config_file.clone().or_else(default_config_path);
        let mut config = match path {
            Some(path) => match load_config_file(&path)? {
                Some(config) => {
                    debug!("Loaded config from {}", path.display());
                    config
                }
                None if overrides.config_file.is_some() => {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )))
                }
                None => Self::default(),
            },
            None => Self::default(),
        };

        // Priority 2: environment variables
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Ok(raw) = std::env::var(ENV_STRICT) {
            match parse_flag(&raw) {
                Some(strict) => config.strict = strict,
                None => warn!("Ignoring {}={:?}: expected a boolean", ENV_STRICT, raw),
            }
        }

        // Priority 1: command line
        if let Some(level) = &overrides.log_level {
            config.log_level = level.clone();
        }
        if let Some(strict) = overrides.strict {
            config.strict = strict;
        }
        if let Some(pretty) = overrides.pretty {
            config.pretty = pretty;
        }

        Ok(config)
    }
}
