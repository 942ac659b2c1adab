use std::path::{Path, PathBuf};
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::assumptions::{AssumptionSet, ServiceLevels};
use crate::brief::{DesignBrief, MediaAssumptions};
use crate::export::DEFAULT_CSV_FILE;
use crate::profile::{ProfileCatalog, DEFAULT_PROFILE};
use crate::session::DesignSession;

pub const LOCAL_CONFIG_FILE: &str = ".sysdesign.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the sizing assistant
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SysDesignConfig {
    /// Problem type selected when none is given on the command line
    #[serde(default = "default_profile")]
    pub default_profile: String,

    /// Optional TOML file replacing the built-in profile catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Seed values for the capacity inputs
    #[serde(default)]
    pub assumptions: AssumptionSet,

    /// Availability, consistency and recovery targets
    #[serde(default)]
    pub service_levels: ServiceLevels,

    /// Free-text context for the walkthrough
    #[serde(default)]
    pub brief: DesignBrief,

    /// Photo/video handling
    #[serde(default)]
    pub media: MediaAssumptions,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for SysDesignConfig {
    fn default() -> Self {
        Self {
            default_profile: default_profile(),
            catalog_path: None,
            assumptions: AssumptionSet::default(),
            service_levels: ServiceLevels::default(),
            brief: DesignBrief::default(),
            media: MediaAssumptions::default(),
            logging: LoggingConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportConfig {
    /// Directory export files are written to when no explicit path is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// File name used for CSV exports
    #[serde(default = "default_csv_file_name")]
    pub csv_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            csv_file_name: default_csv_file_name(),
        }
    }
}

impl ExportConfig {
    /// Where an export named `file_name` lands.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}
fn default_csv_file_name() -> String {
    DEFAULT_CSV_FILE.to_string()
}

/// Loads, validates and hands out the configuration plus the profile
/// catalog it points at.
pub struct ConfigManager {
    config: SysDesignConfig,
    config_path: Option<PathBuf>,
    catalog: Arc<ProfileCatalog>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. `explicit` path, when given (must exist)
    /// 2. ./.sysdesign.toml
    /// 3. ~/.sysdesign/config.toml
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, config_path) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                (Self::read_toml_file(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_config_file()?,
        };
        Self::from_config(config, config_path)
    }

    /// Build a manager around an already-parsed configuration.
    pub fn from_config(
        config: SysDesignConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                let path = Self::relative_to(config_path.as_deref(), path);
                Arc::new(ProfileCatalog::from_file(&path)?)
            }
            None => ProfileCatalog::builtin(),
        };

        Self::validate_config(&config, &catalog)?;

        match &config_path {
            Some(path) => info!("Config file: {}", path.display()),
            None => info!("Config file: NONE (using defaults)"),
        }
        info!(
            "Profiles available: {} (default: {})",
            catalog.len(),
            config.default_profile
        );

        Ok(Self {
            config,
            config_path,
            catalog,
        })
    }

    /// Catalog paths in a config file are relative to that file.
    fn relative_to(config_path: Option<&Path>, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        config_path
            .and_then(Path::parent)
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }

    fn load_config_file() -> Result<(SysDesignConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".sysdesign").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((SysDesignConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<SysDesignConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn validate_config(
        config: &SysDesignConfig,
        catalog: &ProfileCatalog,
    ) -> Result<(), ConfigError> {
        if !catalog.contains(&config.default_profile) {
            return Err(ConfigError::ValidationError(format!(
                "Unknown default profile: {}. Must be one of: {}",
                config.default_profile,
                catalog.names().collect::<Vec<_>>().join(", ")
            )));
        }

        config
            .assumptions
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        config
            .media
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, compact",
                    other
                )))
            }
        }

        let name = config.export.csv_file_name.as_str();
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid export file name: '{}'",
                name
            )));
        }
        if !name.ends_with(".csv") {
            warn!("Export file name '{}' does not end in .csv", name);
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &SysDesignConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn catalog(&self) -> Arc<ProfileCatalog> {
        Arc::clone(&self.catalog)
    }

    /// A fresh session seeded from this configuration. No profile is
    /// selected yet.
    pub fn new_session(&self) -> Result<DesignSession, ConfigError> {
        let mut session =
            DesignSession::with_assumptions(self.catalog(), self.config.assumptions.clone());
        session.set_service_levels(self.config.service_levels.clone());
        session.set_brief(self.config.brief.clone());
        session
            .set_media(self.config.media.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(session)
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = SysDesignConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            }
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SysDesignConfig::default();
        assert_eq!(config.default_profile, "General");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.export.csv_file_name, "system_design_summary.csv");
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_config_validation() {
        let catalog = ProfileCatalog::builtin();
        let config = SysDesignConfig::default();
        assert!(ConfigManager::validate_config(&config, &catalog).is_ok());

        let mut bad_config = config.clone();
        bad_config.default_profile = "Ride Sharing".to_string();
        assert!(ConfigManager::validate_config(&bad_config, &catalog).is_err());

        let mut bad_config = config.clone();
        bad_config.logging.level = "loud".to_string();
        assert!(ConfigManager::validate_config(&bad_config, &catalog).is_err());

        let mut bad_config = config.clone();
        bad_config.assumptions.cache_hit_rate_pct = 120.0;
        assert!(ConfigManager::validate_config(&bad_config, &catalog).is_err());

        let mut bad_config = config;
        bad_config.export.csv_file_name = "../out.csv".to_string();
        assert!(ConfigManager::validate_config(&bad_config, &catalog).is_err());
    }

    #[test]
    fn test_export_path_resolution() {
        let mut export = ExportConfig::default();
        assert_eq!(export.resolve("a.csv"), PathBuf::from("a.csv"));
        export.directory = Some(PathBuf::from("/tmp/exports"));
        assert_eq!(export.resolve("a.csv"), PathBuf::from("/tmp/exports/a.csv"));
    }
}
