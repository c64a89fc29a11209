//! # PlasmaKit Restart
//!
//! Run-from-line support for plasma cutting programs. Given a program and a
//! 0-based line index, the engine reconstructs the modal machine state at
//! that line, refuses unsafe resume points, and synthesizes a program that
//! restores the state, re-approaches the cut and continues with the rest of
//! the original program.
//!
//! Pipeline: [`program`] → [`classifier`] (per line) → [`tracker`] →
//! [`safety`] → [`resume`] + [`leadin`] → [`synthesizer`]. [`engine`] runs a
//! whole request and stages the output file.

pub mod classifier;
pub mod engine;
pub mod expression;
pub mod leadin;
pub mod outcome;
pub mod program;
pub mod resume;
pub mod safety;
pub mod state;
pub mod synthesizer;
pub mod tracker;

pub use classifier::{classify, classify_text, CodeLine, Directive, LineClass, Word};
pub use engine::{Inspection, RestartEngine, StagedRestart};
pub use expression::{extract_axis, format_number, is_expression};
pub use leadin::{compute_lead_in, LeadIn, LeadInError, LeadInPoint};
pub use outcome::{LeadInRequest, RestartOutcome, RestartRequest, RestartWarning};
pub use program::{SourceLine, SourceProgram};
pub use resume::{classify_resume, ResumeMotion, ResumePoint};
pub use safety::{validate, RejectReason};
pub use state::{
    CutterCompensation, DistanceMode, MaterialKind, MaterialSelection, ModalState, MotionKind,
    OutputState, PathBlend, SubroutineMarker, VelocityOverride,
};
pub use synthesizer::{ProgramSynthesizer, Synthesis};
pub use tracker::{prescan, ModalStateTracker, Prescan};
