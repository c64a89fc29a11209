//! Restart request and outcome types

use crate::safety::RejectReason;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lead-in parameters supplied by the operator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadInRequest {
    pub enabled: bool,
    /// Length in the machine's native units
    pub length: f64,
    /// Angle in degrees, any real value
    pub angle: f64,
}

impl Default for LeadInRequest {
    fn default() -> Self {
        Self {
            enabled: false,
            length: 0.0,
            angle: 0.0,
        }
    }
}

/// A request to restart a program part way through
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RestartRequest {
    /// 0-based physical line index to resume from
    pub target_line: usize,
    pub lead_in: LeadInRequest,
}

impl RestartRequest {
    /// Restart at `target_line` without a lead-in
    pub fn at_line(target_line: usize) -> Self {
        Self {
            target_line,
            lead_in: LeadInRequest::default(),
        }
    }

    /// Add a lead-in of `length` at `angle` degrees
    pub fn with_lead_in(mut self, length: f64, angle: f64) -> Self {
        self.lead_in = LeadInRequest {
            enabled: true,
            length,
            angle,
        };
        self
    }
}

/// Non-fatal problem found while building a restart program
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RestartWarning {
    /// The lead-in could not be computed; the restart runs without one
    #[error("lead-in could not be computed, resuming without one: {reason}")]
    LeadInUnavailable { reason: String },

    /// A material selection had an unreadable id and was ignored
    #[error("line {line}: material selection `{text}` has no valid material number, ignored")]
    MaterialParse { line: usize, text: String },
}

/// Result of a restart request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RestartOutcome {
    /// Resuming at the requested line is unsafe; nothing was produced
    Rejected { reason: RejectReason },
    /// A restart program was produced, possibly degraded
    Synthesized {
        lines: Vec<String>,
        warnings: Vec<RestartWarning>,
    },
}

impl RestartOutcome {
    /// Whether the restart was rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Synthesized program lines, if any
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Self::Synthesized { lines, .. } => Some(lines),
            Self::Rejected { .. } => None,
        }
    }

    /// Warnings attached to a synthesized program
    pub fn warnings(&self) -> &[RestartWarning] {
        match self {
            Self::Synthesized { warnings, .. } => warnings,
            Self::Rejected { .. } => &[],
        }
    }

    /// Program text with one newline after every line
    pub fn program_text(&self) -> Option<String> {
        self.lines().map(|lines| {
            let mut text = String::new();
            for line in lines {
                text.push_str(line);
                text.push('\n');
            }
            text
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = RestartRequest::at_line(12).with_lead_in(4.0, 90.0);
        assert_eq!(request.target_line, 12);
        assert!(request.lead_in.enabled);
        assert_eq!(request.lead_in.length, 4.0);
        assert!(!RestartRequest::at_line(3).lead_in.enabled);
    }

    #[test]
    fn test_program_text() {
        let outcome = RestartOutcome::Synthesized {
            lines: vec!["G21".to_string(), "M52 P1".to_string()],
            warnings: Vec::new(),
        };
        assert_eq!(outcome.program_text().as_deref(), Some("G21\nM52 P1\n"));

        let rejected = RestartOutcome::Rejected {
            reason: RejectReason::CutterCompensation,
        };
        assert!(rejected.is_rejected());
        assert!(rejected.program_text().is_none());
        assert!(rejected.warnings().is_empty());
    }

    #[test]
    fn test_warning_messages() {
        let warning = RestartWarning::MaterialParse {
            line: 4,
            text: "M190 P#<mat>".to_string(),
        };
        assert!(warning.to_string().contains("line 4"));
        let warning = RestartWarning::LeadInUnavailable {
            reason: "no resume coordinate for axis X".to_string(),
        };
        assert!(warning.to_string().starts_with("lead-in could not be computed"));
    }
}
