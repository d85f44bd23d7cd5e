//! `energy-intake.toml` loading.
//!
//! Every field has a default, so an empty or missing file is valid:
//!
//! ```toml
//! session_file = ".energy-intake-session"
//!
//! [store]
//! backend = "sqlite"
//! connection_string = "energy.db"
//!
//! [analytics]
//! price_per_kwh = "8"
//! co2_kg_per_kwh = "0.4"
//!
//! [logging]
//! level = "info"
//! file = "energy-intake.log"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use energy_core::analytics::AnalyticsConfig;
use energy_core::store::StoreConfig;
use serde::Deserialize;
use tracing::debug;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "energy-intake.toml";

pub const DEFAULT_DATABASE: &str = "energy.db";

pub const DEFAULT_SESSION_FILE: &str = ".energy-intake-session";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Append log records to this file as well as the console.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
    /// Where the access token of the signed-in user is kept between runs.
    pub session_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: "sqlite".to_string(),
                connection_string: DEFAULT_DATABASE.to_string(),
            },
            analytics: AnalyticsConfig::default(),
            logging: LoggingConfig::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if it exists, or the defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.is_file() {
            debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
