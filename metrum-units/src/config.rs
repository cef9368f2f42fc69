//! Registry configuration

use serde::{Serialize, Deserialize};
use metrum_core::DEFAULT_PRECISION;

use crate::UnitError;

/// Settings a registry is built with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Format spec used by `Display` for units and quantities
    pub default_format: String,
    /// Locale for localized formatting when none is passed explicitly
    pub fmt_locale: Option<String>,
    /// Foreign types that wrap quantities; elementwise handlers defer to them
    pub upcast_types: Vec<String>,
    /// Decimal digits for non-integer powers
    pub precision: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_format: "D".to_string(),
            fmt_locale: None,
            upcast_types: ["PintArray", "Series", "DataArray", "Dataset", "Variable"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_format(mut self, spec: &str) -> Self {
        self.default_format = spec.to_string();
        self
    }

    pub fn with_fmt_locale(mut self, locale: &str) -> Self {
        self.fmt_locale = Some(locale.to_string());
        self
    }

    pub fn with_upcast_types(mut self, types: &[&str]) -> Self {
        self.upcast_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, UnitError> {
        serde_json::from_str(json).map_err(|e| UnitError::Config(e.to_string()))
    }
}
