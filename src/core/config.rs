use crate::core::registry::RegistryLocation;
use crate::providers::cursbnr::{
    DEFAULT_DOMESTIC_CURRENCY, DEFAULT_TABLE_ID, DEFAULT_TIMEOUT_SECS, DEFAULT_URL,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_REFERENCE: &str = "USD";

fn default_reference() -> String {
    DEFAULT_REFERENCE.to_string()
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_table_id() -> String {
    DEFAULT_TABLE_ID.to_string()
}

fn default_domestic_currency() -> String {
    DEFAULT_DOMESTIC_CURRENCY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_table_id")]
    pub table_id: String,
    /// Currency the page quotes against. It is not listed in the table and is
    /// added with a rate of 1.
    #[serde(default = "default_domestic_currency")]
    pub domestic_currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: default_url(),
            table_id: default_table_id(),
            domestic_currency: default_domestic_currency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_reference")]
    pub reference: String,
    #[serde(default)]
    pub source: SourceConfig,
    pub registry_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            reference: default_reference(),
            source: SourceConfig::default(),
            registry_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the built-in defaults
    /// when no config file has been set up.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "ratesheet", "ratesheet")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn registry_location(&self) -> RegistryLocation {
        match &self.registry_path {
            Some(path) => RegistryLocation::File(PathBuf::from(path)),
            None => RegistryLocation::Bundled,
        }
    }
}
