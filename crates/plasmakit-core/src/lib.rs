//! # PlasmaKit Core
//!
//! Core types and utilities shared by the PlasmaKit crates.
//! Provides the error taxonomy for environment-level failures and the
//! unit system model used when scaling machine values into program units.

pub mod error;
pub mod units;

pub use error::{Error, ProgramError, Result};
pub use units::{Units, INCHES_PER_MM, MM_PER_INCH};
