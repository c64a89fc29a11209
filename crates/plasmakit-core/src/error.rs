//! Error handling for PlasmaKit
//!
//! Only environment-level failures are errors here: a program that cannot
//! be read, a destination that cannot be written, or a caller asking for a
//! line the program does not have. Problems with the program content itself
//! (an unsafe resume point, a lead-in that cannot be computed) are reported
//! as values by the restart engine, never through these types.
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Program file error type
///
/// Represents failures to load a source program or stage a synthesized one.
#[derive(Error, Debug)]
pub enum ProgramError {
    /// Source program does not exist
    #[error("Program not found: {path}")]
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// Source program could not be read
    #[error("Failed to read program {path}: {source}")]
    Read {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Synthesized program could not be written
    #[error("Failed to write program {path}: {source}")]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Requested restart line is past the end of the program
    #[error("Line {line} is outside the program ({total} lines)")]
    TargetOutOfRange {
        /// The requested 0-based line index.
        line: usize,
        /// The number of physical lines in the program.
        total: usize,
    },
}

/// Main error type for PlasmaKit
///
/// A unified error type for the out-of-band failure path.
#[derive(Error, Debug)]
pub enum Error {
    /// Program file error
    #[error(transparent)]
    Program(#[from] ProgramError),
}

impl Error {
    /// Check if this is a program file error
    pub fn is_program_error(&self) -> bool {
        matches!(self, Error::Program(_))
    }

    /// Check if the caller asked for a line that does not exist
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::Program(ProgramError::TargetOutOfRange { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
