//! # PlasmaKit
//!
//! Run-from-line restart engine for CNC plasma cutting programs.
//!
//! ## Architecture
//!
//! PlasmaKit is organized as a workspace with multiple crates:
//!
//! 1. **plasmakit-core** - Error taxonomy and unit system model
//! 2. **plasmakit-settings** - Machine and restart configuration (JSON/TOML)
//! 3. **plasmakit-restart** - Line classification, modal state replay, safety
//!    checks, lead-in geometry and restart program synthesis
//! 4. **plasmakit** - Main binary that integrates all crates
//!
//! ## Features
//!
//! - **Modal State Replay**: units, compensation, path blending, distance modes,
//!   torch/THC outputs, velocity override, material, feed and parameters
//! - **Safety Gate**: refuses restarts under cutter compensation or inside `o` blocks
//! - **Lead-in**: approach moves for literal and parametric resume coordinates
//! - **Inspection**: reports the reconstructed state without writing anything

pub use plasmakit_core::{Error, ProgramError, Result, Units};
pub use plasmakit_restart as restart;
pub use plasmakit_restart::{
    Inspection, LeadInRequest, ModalState, RejectReason, RestartEngine, RestartOutcome,
    RestartRequest, RestartWarning, SourceProgram, StagedRestart,
};
pub use plasmakit_settings::{Config, MachineSettings, RestartSettings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, so synthesized programs can go to stdout
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
