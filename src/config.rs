//! Tunables of an alignment run
//!
//! Every field has a default, a TOML file only needs the values it changes:
//!
//! ```toml
//! [locator]
//! tolerance_px = 1e-8
//! max_iterations = 100
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub locator: LocatorConfig,
    pub gate: GateConfig,
    pub region: RegionConfig,
}

impl AlignConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

/// Root finder settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Stop once the displacement norm is below this many pixels
    pub tolerance_px: f64,
    pub max_iterations: usize,
    /// Step of the forward differences for the initial Jacobian
    pub probe_step_px: f64,
    /// Jacobian determinants (or update denominators) below this are singular
    pub singular_threshold: f64,
}
impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            tolerance_px: 1e-6,
            max_iterations: 50,
            probe_step_px: 1.0,
            singular_threshold: 1e-12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Both declinations must be beyond +/- this many degrees
    pub pole_threshold_deg: f64,
}
impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pole_threshold_deg: 65.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Margin around the points of interest
    pub margin_arcsec: f64,
}
impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            margin_arcsec: 2500.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    TomlError(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(AlignConfig::from_toml_str("").unwrap(), AlignConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AlignConfig::from_toml_str(
            "[locator]\nmax_iterations = 80\n\n[gate]\npole_threshold_deg = 70.0\n",
        )
        .unwrap();
        assert_eq!(config.locator.max_iterations, 80);
        assert_eq!(config.locator.tolerance_px, 1e-6);
        assert_eq!(config.gate.pole_threshold_deg, 70.0);
        assert_eq!(config.region, RegionConfig::default());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            AlignConfig::from_toml_str("[locator]\nmax_iterations = \"many\""),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[region]\nmargin_arcsec = 1200.0").unwrap();
        let config = AlignConfig::load(file.path()).unwrap();
        assert_eq!(config.region.margin_arcsec, 1200.0);
    }
}
