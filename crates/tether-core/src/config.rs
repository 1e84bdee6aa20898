//! Configuration for Tether components.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`TETHER__` prefix, `__` separator)
//! 2. Config file (`tether.toml`)
//! 3. Defaults

use serde::Deserialize;

use crate::error::TetherError;

/// Top-level Tether configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TetherConfig {
    /// Type resolver settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Graph backend connection settings.
    #[serde(default)]
    pub graph: GraphSettings,
}

impl TetherConfig {
    /// Load configuration from `tether.toml` and `TETHER__` env vars.
    pub fn load() -> Result<Self, TetherError> {
        Self::load_from("tether.toml")
    }

    /// Load configuration from a specific file path (plus env overrides).
    pub fn load_from(path: &str) -> Result<Self, TetherError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("TETHER").separator("__"))
            .build()
            .map_err(|e| TetherError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| TetherError::Config(e.to_string()))
    }
}

/// Settings for the canonical type resolver.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverConfig {
    /// Extra root base types appended to the built-in default set.
    /// Append-only: the defaults are always recognized.
    #[serde(default)]
    pub root_types: Vec<String>,
}

/// Connection settings for the Neo4j-backed store.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: String::new(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}
