//! Resume safety checks
//!
//! Pure checks on a reconstructed [`ModalState`]. Callers may run these on
//! their own, before any geometry is computed, to show an operator a single
//! error message.

use crate::state::ModalState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why resuming at a line is unsafe
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Compensation is on, or was turned on and never turned off
    #[error("cannot restart while cutter compensation is engaged")]
    CutterCompensation,

    /// The line sits inside an open `o` block
    #[error("cannot restart inside a subroutine")]
    InsideSubroutine {
        /// Labels of the open blocks, outermost first
        open: Vec<String>,
    },
}

/// Check whether resuming with `state` is safe.
///
/// Compensation is reported before subroutine nesting when both apply.
pub fn validate(state: &ModalState) -> Result<(), RejectReason> {
    if state.compensation_engaged() {
        return Err(RejectReason::CutterCompensation);
    }
    if state.subroutine_depth() > 0 {
        return Err(RejectReason::InsideSubroutine {
            open: state.open_blocks.iter().map(|b| b.label.clone()).collect(),
        });
    }
    Ok(())
}
