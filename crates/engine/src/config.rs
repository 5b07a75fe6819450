//! Store configuration via TOML or JSON
//!
//! A configuration names the binning scheme, the filter tree and any
//! deployment-wide property defaults. Files are parsed by extension:
//! `.json` as JSON, anything else as TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use annostore_core::{AnnotationError, BinningScheme, FilterConfig, Result};
use annostore_filter::PropertyDefaults;

/// Store configuration
///
/// # Example
///
/// ```toml
/// [binning]
/// scheme = "widths"
/// widths = { "1" = 5, "2" = 10 }
///
/// [[filters]]
/// type = "script"
/// properties = { script = "annotation.payload.visible == true" }
///
/// [[filters]]
/// type = "most_recent_by_group"
///
/// [defaults.most_recent_by_group]
/// count = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Binning scheme; a depth-20 pyramid when omitted
    #[serde(default)]
    pub binning: BinningScheme,
    /// Top-level filter nodes, evaluated in order
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    /// Property defaults keyed by filter type, then property
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl StoreConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text does not parse, `InvalidBinning` if the
    /// binning scheme is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| AnnotationError::Config(format!("Failed to parse TOML config: {}", e)))?;
        config.binning.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text does not parse, `InvalidBinning` if the
    /// binning scheme is malformed.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(content)
            .map_err(|e| AnnotationError::Config(format!("Failed to parse JSON config: {}", e)))?;
        config.binning.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnnotationError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        parsed.map_err(|e| match e {
            AnnotationError::Config(reason) => {
                AnnotationError::Config(format!("{} ({})", reason, path.display()))
            }
            other => other,
        })
    }

    /// Serialize this config to TOML and write it to the given path
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AnnotationError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            AnnotationError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Property defaults in the form the filter registry consumes
    pub fn property_defaults(&self) -> PropertyDefaults {
        PropertyDefaults::from(self.defaults.clone())
    }
}
