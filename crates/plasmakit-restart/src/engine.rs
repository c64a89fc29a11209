//! Restart request pipeline
//!
//! Runs one request end to end: split the program at the target, replay the
//! prefix, gate on safety, synthesize, and stage the result. A rejected
//! request never touches the output file.

use crate::outcome::{RestartOutcome, RestartRequest};
use crate::program::SourceProgram;
use crate::resume::{classify_resume, ResumePoint};
use crate::safety::{validate, RejectReason};
use crate::state::ModalState;
use crate::synthesizer::ProgramSynthesizer;
use crate::tracker::{prescan, Prescan};
use plasmakit_core::{ProgramError, Result};
use plasmakit_settings::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Modal state and verdict at a line, without synthesis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub target_line: usize,
    pub state: ModalState,
    pub resume: ResumePoint,
    pub verdict: std::result::Result<(), RejectReason>,
    pub warnings: Vec<String>,
}

/// Outcome of a request that reads and writes program files
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRestart {
    pub outcome: RestartOutcome,
    /// Where the program was written; `None` when rejected
    pub output_path: Option<PathBuf>,
    /// Program to offer returning to once the restart has run
    pub previous_program: Option<PathBuf>,
}

/// Runs restart requests against one configuration
#[derive(Debug, Clone, Default)]
pub struct RestartEngine {
    config: Config,
}

impl RestartEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reconstruct the state at `target` and check it, without synthesizing
    pub fn inspect(&self, program: &SourceProgram, target: usize) -> Result<Inspection> {
        let (head, tail) = program.split_at_target(target)?;
        let Prescan { state, warnings } =
            prescan(head, self.config.restart.transient_material_threshold);
        Ok(Inspection {
            target_line: target,
            resume: classify_resume(tail, state.last_motion),
            verdict: validate(&state),
            warnings: warnings.iter().map(ToString::to_string).collect(),
            state,
        })
    }

    /// Build the restart program for `request`
    pub fn restart(&self, program: &SourceProgram, request: &RestartRequest) -> Result<RestartOutcome> {
        let target = request.target_line;
        info!("Restarting from line {} of {} lines", target, program.len());

        let (head, tail) = program.split_at_target(target)?;
        let Prescan { state, warnings } =
            prescan(head, self.config.restart.transient_material_threshold);

        if let Err(reason) = validate(&state) {
            warn!("Restart at line {} rejected: {}", target, reason);
            return Ok(RestartOutcome::Rejected { reason });
        }

        let synthesis = ProgramSynthesizer::new(&self.config.machine, &self.config.restart)
            .synthesize(&state, tail, &request.lead_in);

        let mut all_warnings = warnings;
        all_warnings.extend(synthesis.warnings);
        Ok(RestartOutcome::Synthesized {
            lines: synthesis.lines,
            warnings: all_warnings,
        })
    }

    /// Load `source`, build the restart program and write it to `output`
    /// (or the configured scratch file).
    pub fn restart_file(
        &self,
        source: &Path,
        request: &RestartRequest,
        output: Option<&Path>,
    ) -> Result<StagedRestart> {
        let program = SourceProgram::load(source)?;
        let outcome = self.restart(&program, request)?;

        let Some(text) = outcome.program_text() else {
            return Ok(StagedRestart {
                outcome,
                output_path: None,
                previous_program: None,
            });
        };

        let output = output.unwrap_or(self.config.restart.output_file.as_path());
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ProgramError::Write {
                    path: output.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(output, text).map_err(|source| ProgramError::Write {
            path: output.to_path_buf(),
            source,
        })?;
        info!("Restart program written to {}", output.display());

        // restarting a restart keeps the original return target
        let previous_program = (!same_file(source, output)).then(|| source.to_path_buf());

        Ok(StagedRestart {
            outcome,
            output_path: Some(output.to_path_buf()),
            previous_program,
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
