//! Configuration for the restart engine
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into two sections:
//! - Machine settings (native units, Z limit, retract clearance)
//! - Restart settings (dialect directives, material threshold, scratch file)

use crate::error::{ConfigError, SettingsError, SettingsResult};
pub use plasmakit_core::units::Units;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Machine preference settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Units the machine configuration is expressed in
    pub native_units: Units,
    /// Z axis maximum, either a literal or a runtime parameter expression
    pub z_max_limit: String,
    /// Distance below the Z maximum used for the safe retract in a
    /// millimetre program (mm)
    pub z_clearance_mm: f64,
    /// Same clearance for an inch program on an inch machine (inch)
    pub z_clearance_inch: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            native_units: Units::Millimetre,
            z_max_limit: "#<_ini[axis_z]max_limit>".to_string(),
            z_clearance_mm: 5.0,
            z_clearance_inch: 0.02,
        }
    }
}

/// Restart engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartSettings {
    /// Material ids at or above this value are transient placeholders
    pub transient_material_threshold: u64,
    /// Feed directive emitted when the program never set one
    pub default_feed_expression: Option<String>,
    /// Directive that lets the motion executor accept out-of-sequence moves
    pub resume_marker: String,
    /// Directive that waits for a material change to be applied
    pub material_activation: String,
    /// Where the synthesized program is written
    pub output_file: PathBuf,
}

impl Default for RestartSettings {
    fn default() -> Self {
        Self {
            transient_material_threshold: 1_000_000,
            default_feed_expression: Some("F#<_hal[plasmac.cut-feed-rate]>".to_string()),
            resume_marker: "M52 P1".to_string(),
            material_activation: "M66 P3 L3 Q1".to_string(),
            output_file: std::env::temp_dir().join("rfl.ngc"),
        }
    }
}

/// Complete configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Machine preferences
    pub machine: MachineSettings,
    /// Restart engine preferences
    pub restart: RestartSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config directory for PlasmaKit
    pub fn config_dir() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("plasmakit"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Default config file path
    pub fn config_file_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the default config file, or defaults when it does not exist
    pub fn load_or_default() -> SettingsResult<Self> {
        let path = Self::config_file_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machine.z_max_limit.trim().is_empty() {
            return Err(ConfigError::MissingValue("machine.z_max_limit".to_string()));
        }

        for (key, value) in [
            ("machine.z_clearance_mm", self.machine.z_clearance_mm),
            ("machine.z_clearance_inch", self.machine.z_clearance_inch),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        if self.restart.transient_material_threshold == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "restart.transient_material_threshold".to_string(),
                value: "0".to_string(),
            });
        }

        if self.restart.resume_marker.trim().is_empty() {
            return Err(ConfigError::MissingValue("restart.resume_marker".to_string()));
        }

        if self.restart.material_activation.trim().is_empty() {
            return Err(ConfigError::MissingValue(
                "restart.material_activation".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.machine.native_units, Units::Millimetre);
        assert_eq!(config.restart.transient_material_threshold, 1_000_000);
        assert_eq!(config.restart.resume_marker, "M52 P1");
    }

    #[test]
    fn test_rejects_bad_clearance() {
        let mut config = Config::default();
        config.machine.z_clearance_mm = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));

        config.machine.z_clearance_mm = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.machine.z_clearance_inch = -0.02;
        match config.validate() {
            Err(ConfigError::ValueOutOfRange { key, .. }) => {
                assert_eq!(key, "machine.z_clearance_inch")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_empty_directives() {
        let mut config = Config::default();
        config.restart.resume_marker = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue(_))
        ));

        let mut config = Config::default();
        config.machine.z_max_limit.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [machine]
            native_units = "inch"
            "#,
        )
        .unwrap();
        assert_eq!(config.machine.native_units, Units::Inch);
        assert_eq!(config.machine.z_clearance_mm, 5.0);
        assert_eq!(config.machine.z_clearance_inch, 0.02);
        assert_eq!(config.restart, RestartSettings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.machine.native_units = Units::Inch;
        config.machine.z_max_limit = "4.5".to_string();
        config.restart.default_feed_expression = Some("F1500".to_string());

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            let loaded = Config::load_from_file(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let err = Config::default().save_to_file(&path).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }
}
