//! Resume point classification
//!
//! Decides whether the first move at or after the restart line is a rapid or
//! a cutting move. A line with axis words but no motion word moves with the
//! motion mode carried in from earlier lines; a motion word on a line with no
//! axis words only changes that mode.

use crate::classifier::{classify, LineClass};
use crate::program::SourceLine;
use crate::state::MotionKind;
use serde::{Deserialize, Serialize};

/// Kind of the first move after the restart line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumeMotion {
    Rapid,
    /// Linear or arc feed move; also the default when no move is found
    Feed,
}

impl From<MotionKind> for ResumeMotion {
    fn from(kind: MotionKind) -> Self {
        if kind.is_rapid() {
            Self::Rapid
        } else {
            Self::Feed
        }
    }
}

/// Where and how the program resumes moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    pub motion: ResumeMotion,
    /// Offset into the tail of the first moving line, if any
    pub first_move: Option<usize>,
}

/// Classify the first move in `tail`, the lines from the restart target on.
///
/// `carried` is the motion mode in effect before the target.
pub fn classify_resume(tail: &[SourceLine], carried: Option<MotionKind>) -> ResumePoint {
    let mut carried = carried;

    for (offset, line) in tail.iter().enumerate() {
        let LineClass::Motion(code) = classify(line) else {
            continue;
        };
        let explicit = code.motion();
        if code.has_axis_words() {
            let motion = explicit
                .or(carried)
                .map(ResumeMotion::from)
                .unwrap_or(ResumeMotion::Feed);
            return ResumePoint {
                motion,
                first_move: Some(offset),
            };
        }
        if explicit.is_some() {
            carried = explicit;
        }
    }

    ResumePoint {
        motion: ResumeMotion::Feed,
        first_move: None,
    }
}
