//! Configuration loading and resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are merged by the binary's argument parser and arrive here
//! as [`ConfigOverrides`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Application directory name used under platform config/data folders
const APP_DIR: &str = "staffdb";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub database: Option<PathBuf>,
    pub reference_dir: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl TomlConfig {
    /// Parse a config file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load the config file if one is available
    ///
    /// An explicitly named file must exist and parse. Without one, the
    /// platform default location is tried and a missing file yields an
    /// empty config.
    pub fn load_optional(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config file: {}", path.display());
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config file: {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "No config file at {}; using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory; using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub reference_dir: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Built-in fallbacks for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub database: PathBuf,
    pub reference_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("./staffdb_data"));

        Self {
            database: data_dir.join("api.db"),
            reference_dir: PathBuf::from("."),
            uploads_dir: PathBuf::from("uploads"),
            host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database: PathBuf,
    /// Directory holding `departments.csv` and `jobs.csv`
    pub reference_dir: PathBuf,
    /// Directory receiving the raw payload of each upload
    pub uploads_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl ServiceConfig {
    /// Merge overrides, file config and defaults by priority
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig, defaults: CompiledDefaults) -> Self {
        let config = Self {
            database: overrides.database.or(file.database).unwrap_or(defaults.database),
            reference_dir: overrides
                .reference_dir
                .or(file.reference_dir)
                .unwrap_or(defaults.reference_dir),
            uploads_dir: overrides
                .uploads_dir
                .or(file.uploads_dir)
                .unwrap_or(defaults.uploads_dir),
            host: overrides.host.or(file.host).unwrap_or(defaults.host),
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
        };
        debug!(?config, "Resolved service configuration");
        config
    }

    /// `host:port` string suitable for binding a listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn departments_csv(&self) -> PathBuf {
        self.reference_dir.join("departments.csv")
    }

    pub fn jobs_csv(&self) -> PathBuf {
        self.reference_dir.join("jobs.csv")
    }
}

/// Platform default location of `config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> CompiledDefaults {
        CompiledDefaults {
            database: PathBuf::from("/default/api.db"),
            reference_dir: PathBuf::from("."),
            uploads_dir: PathBuf::from("uploads"),
            host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }

    #[test]
    fn test_defaults_used_when_nothing_set() {
        let config = ServiceConfig::resolve(ConfigOverrides::default(), TomlConfig::default(), defaults());
        assert_eq!(config.database, PathBuf::from("/default/api.db"));
        assert_eq!(config.bind_address(), "0.0.0.0:8888");
        assert_eq!(config.jobs_csv(), PathBuf::from("./jobs.csv"));
    }

    #[test]
    fn test_file_beats_defaults_and_overrides_beat_file() {
        let file = TomlConfig {
            port: Some(9000),
            host: Some("127.0.0.1".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9100),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(overrides, file, defaults());
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let result = TomlConfig::parse("prot = 80\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
