//! Source program loading
//!
//! A program is read once, fully buffered, and split into physical lines.
//! Line indices are 0-based and count every physical line, comments and
//! blank lines included, so they match what the operator selected.

use plasmakit_core::{ProgramError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One physical line of a loaded program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// 0-based physical line index
    pub index: usize,
    /// Raw line text without the line terminator
    pub text: String,
}

impl SourceLine {
    /// Create a source line
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A loaded program
#[derive(Debug, Clone, Default)]
pub struct SourceProgram {
    lines: Vec<SourceLine>,
    path: Option<PathBuf>,
}

impl SourceProgram {
    /// Build a program from in-memory text
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| SourceLine::new(index, line))
            .collect();
        Self { lines, path: None }
    }

    /// Read a program from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProgramError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ProgramError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut program = Self::from_text(&content);
        program.path = Some(path.to_path_buf());
        debug!("Loaded {} lines from {}", program.len(), path.display());
        Ok(program)
    }

    /// All lines in order
    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    /// Number of physical lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the program has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Path the program was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Split into the lines before `target` and the lines from `target` on
    pub fn split_at_target(&self, target: usize) -> Result<(&[SourceLine], &[SourceLine])> {
        if target >= self.lines.len() {
            return Err(ProgramError::TargetOutOfRange {
                line: target,
                total: self.lines.len(),
            }
            .into());
        }
        Ok(self.lines.split_at(target))
    }
}
