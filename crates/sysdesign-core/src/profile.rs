//! Problem-type profiles and the read-only catalog they are resolved from.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assumptions::{check_non_negative, check_percent};
use crate::config_manager::ConfigError;
use crate::error::{OverrideKind, Result, SizingError};

/// Toggle names shared by the built-in profiles.
pub mod toggles {
    pub const USE_CDN: &str = "Use CDN";
    pub const MULTI_REGION: &str = "Multi-Region";
    pub const COMPRESSION: &str = "Compression";
    pub const ADAPTIVE_BITRATE: &str = "Adaptive Bitrate";
    pub const LIFECYCLE_POLICIES: &str = "Lifecycle Policies";
    pub const STORES_PII: &str = "Stores PII";
    pub const REGION_LOCKING: &str = "Region Locking";
    pub const DISASTER_RECOVERY: &str = "Disaster Recovery";
}

/// Param names shared by the built-in profiles.
pub mod params {
    pub const DATA_RETENTION_DAYS: &str = "Data Retention (days)";
    pub const TARGET_UPTIME_PCT: &str = "Target Uptime (%)";
    pub const P95_LATENCY_MS: &str = "P95 Latency Target (ms)";
    pub const CACHE_HIT_RATE_PCT: &str = "Cache Hit Rate (%)";
}

pub const DEFAULT_PROFILE: &str = "General";

const BUILTIN_CATALOG: &str = include_str!("profiles.toml");

static BUILTIN: Lazy<Arc<ProfileCatalog>> = Lazy::new(|| {
    Arc::new(
        ProfileCatalog::from_toml_str(BUILTIN_CATALOG)
            .expect("built-in profile catalog must parse"),
    )
});

/// One canonical design scenario: default toggles and params plus static
/// recommendation text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProfileDefinition {
    pub name: String,
    #[serde(default)]
    pub toggles: BTreeMap<String, bool>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default)]
    pub architecture_layers: Vec<String>,
    pub database_recommendation: String,
    pub rationale: String,
    #[serde(default)]
    pub tradeoffs: String,
    #[serde(default)]
    pub failure_modeling: String,
}

impl ProfileDefinition {
    /// Missing toggles read as disabled.
    pub fn toggle(&self, name: &str) -> bool {
        self.toggles.get(name).copied().unwrap_or(false)
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    pub fn cache_hit_rate(&self) -> Option<f64> {
        self.param(params::CACHE_HIT_RATE_PCT)
    }

    pub fn set_toggle(&mut self, name: &str, value: bool) -> Result<()> {
        match self.toggles.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(SizingError::UnknownOverrideKey {
                kind: OverrideKind::Toggle,
                key: name.to_string(),
            }),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match self.params.get_mut(name) {
            Some(slot) => {
                check_param(name, value)?;
                *slot = value;
                Ok(())
            }
            None => Err(SizingError::UnknownOverrideKey {
                kind: OverrideKind::Param,
                key: name.to_string(),
            }),
        }
    }

    /// Apply every override or none of them.
    pub fn apply_overrides(&mut self, overrides: &ProfileOverrides) -> Result<()> {
        let mut candidate = self.clone();
        for (name, value) in &overrides.toggles {
            candidate.set_toggle(name, *value)?;
        }
        for (name, value) in &overrides.params {
            candidate.set_param(name, *value)?;
        }
        *self = candidate;
        Ok(())
    }
}

/// User replacements for a subset of a profile's toggles and params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(default)]
    pub toggles: BTreeMap<String, bool>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ProfileOverrides {
    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty() && self.params.is_empty()
    }

    /// Parse a `Name=true|false` assignment.
    pub fn parse_toggle(assignment: &str) -> Result<(String, bool)> {
        let (name, raw) = split_assignment(assignment)?;
        let value = match raw.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => true,
            "false" | "off" | "no" | "0" => false,
            _ => {
                return Err(SizingError::invalid(
                    name,
                    format!("expected true or false, got '{raw}'"),
                ))
            }
        };
        Ok((name.to_string(), value))
    }

    /// Parse a `Name=number` assignment.
    pub fn parse_param(assignment: &str) -> Result<(String, f64)> {
        let (name, raw) = split_assignment(assignment)?;
        let value = raw
            .parse::<f64>()
            .map_err(|_| SizingError::invalid(name, format!("expected a number, got '{raw}'")))?;
        Ok((name.to_string(), value))
    }
}

/// Params named `... (%)` are percentages; every other param is a
/// non-negative quantity.
fn check_param(name: &str, value: f64) -> Result<()> {
    if name.trim_end().ends_with("(%)") {
        check_percent(name, value)
    } else {
        check_non_negative(name, value)
    }
}

fn split_assignment(assignment: &str) -> Result<(&str, &str)> {
    // Param names contain parentheses and spaces, never '='.
    let (name, raw) = assignment
        .rsplit_once('=')
        .ok_or_else(|| SizingError::invalid(assignment.trim(), "expected NAME=VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(SizingError::invalid(assignment.trim(), "missing name before '='"));
    }
    Ok((name, raw.trim()))
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    profile: Vec<ProfileDefinition>,
}

/// Immutable table of profiles, keyed by problem-type name.
///
/// Lookups hand out owned copies so callers can override toggles and params
/// without touching the table.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: Vec<ProfileDefinition>,
}

impl ProfileCatalog {
    /// The catalog compiled into the library, parsed once per process.
    pub fn builtin() -> Arc<ProfileCatalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let catalog = Self {
            profiles: file.profile,
        };
        catalog.validate()?;
        debug!(profiles = catalog.profiles.len(), "parsed profile catalog");
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        let catalog = Self::from_toml_str(&content)?;
        info!("Loaded profile catalog from {}", path.display());
        Ok(catalog)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile catalog defines no profiles".to_string(),
            ));
        }
        for (idx, profile) in self.profiles.iter().enumerate() {
            if profile.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "profile #{} has an empty name",
                    idx + 1
                )));
            }
            if self.profiles[..idx].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name: {}",
                    profile.name
                )));
            }
            for (name, value) in &profile.params {
                check_param(name, *value).map_err(|e| {
                    ConfigError::ValidationError(format!("profile '{}': {}", profile.name, e))
                })?;
            }
        }
        Ok(())
    }

    /// Profile names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn profiles(&self) -> &[ProfileDefinition] {
        &self.profiles
    }

    pub fn contains(&self, key: &str) -> bool {
        self.profiles.iter().any(|p| p.name == key)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Owned copy of the profile named `key`.
    pub fn resolve(&self, key: &str) -> Result<ProfileDefinition> {
        self.profiles
            .iter()
            .find(|p| p.name == key)
            .cloned()
            .ok_or_else(|| SizingError::UnknownProfile(key.to_string()))
    }

    /// Resolve `key` and apply `overrides` to the copy.
    pub fn resolve_with(
        &self,
        key: &str,
        overrides: &ProfileOverrides,
    ) -> Result<ProfileDefinition> {
        let mut profile = self.resolve(key)?;
        profile.apply_overrides(overrides)?;
        Ok(profile)
    }
}
