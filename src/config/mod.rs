use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{Endpoint, Place};
use crate::error::ConfigError;

/// Registry shipped with the binary, used when no config file is found.
pub const BUILTIN_CONFIG: &str = include_str!("places.toml");

fn default_app_name() -> String {
    "placemap".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("placemap/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Everything the application knows before the first request goes out.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Descriptor for the street address -> lat/lng service.
    pub geocode: Endpoint,
    #[serde(default)]
    pub places: BTreeMap<String, Place>,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FileConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(BUILTIN_CONFIG)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// First parseable file on the search path, if any.
    pub fn load() -> Option<Self> {
        load_from(&get_config_paths())
    }

    /// Explicit path wins; otherwise the search path; otherwise the built-in
    /// registry.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => match Self::load() {
                Some(config) => Ok(config),
                None => Self::builtin(),
            },
        }
    }
}

fn load_from(paths: &[PathBuf]) -> Option<FileConfig> {
    for path in paths {
        if !path.exists() {
            continue;
        }
        match FileConfig::from_path(path) {
            Ok(config) => {
                log::debug!("Loaded config from {}", path.display());
                return Some(config);
            }
            Err(e) => log::warn!("Skipping config file {}: {}", path.display(), e),
        }
    }
    None
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("placemap.toml"));
    paths.push(PathBuf::from(".placemap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("placemap").join("config.toml"));
        paths.push(config_dir.join("placemap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".placemap.toml"));
    }

    paths
}
