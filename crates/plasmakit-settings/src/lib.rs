//! PlasmaKit Settings Crate
//!
//! Machine and restart configuration, loaded from and saved to JSON or TOML
//! files in the platform configuration directory.

pub mod config;
pub mod error;

pub use config::{Config, MachineSettings, RestartSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
