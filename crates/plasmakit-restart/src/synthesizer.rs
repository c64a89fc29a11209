//! Restart program synthesis
//!
//! Builds the program that restores the reconstructed modal state and then
//! continues with the original program from the restart line. The section
//! order is fixed, since spindle start versus positioning encodes a physical
//! safety constraint:
//!
//! 1. Parameter assignments
//! 2. Units, compensation release, path blend, distance and arc distance modes
//! 3. Resume marker
//! 4. Torch and THC output states
//! 5. Velocity override
//! 6. Safe Z retract in machine coordinates
//! 7. Material selection and activation
//! 8. Feed
//! 9. Positioning, lead-in and spindle start
//! 10. The remaining program

use crate::classifier::{classify, CodeLine, Directive, LineClass};
use crate::expression::format_number;
use crate::leadin::{compute_lead_in, LeadIn};
use crate::outcome::{LeadInRequest, RestartWarning};
use crate::program::SourceLine;
use crate::resume::{classify_resume, ResumeMotion};
use crate::state::{MaterialKind, MaterialSelection, ModalState};
use crate::tracker::parse_material_id;
use plasmakit_core::units::{INCHES_PER_MM, MM_PER_INCH};
use plasmakit_core::Units;
use plasmakit_settings::{MachineSettings, RestartSettings};
use tracing::{debug, warn};

/// A material selection at the start of the tail moved into the preamble
#[derive(Debug, Clone, PartialEq)]
struct FoldedMaterial {
    selection: MaterialSelection,
    /// Tail lines consumed by the fold
    lines: usize,
}

/// Synthesized program and the degradations met while building it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Synthesis {
    pub lines: Vec<String>,
    pub warnings: Vec<RestartWarning>,
}

/// Assembles restart programs
#[derive(Debug, Clone)]
pub struct ProgramSynthesizer<'a> {
    machine: &'a MachineSettings,
    restart: &'a RestartSettings,
}

impl<'a> ProgramSynthesizer<'a> {
    pub fn new(machine: &'a MachineSettings, restart: &'a RestartSettings) -> Self {
        Self { machine, restart }
    }

    /// Units the program runs in at the restart line
    pub fn program_units(&self, state: &ModalState) -> Units {
        state.units.unwrap_or(self.machine.native_units)
    }

    /// Safe Z retract expressed in the program's units.
    ///
    /// The Z maximum is a machine value, so a conversion is written into
    /// the expression only when the program runs in the other unit system.
    /// The clearance is the millimetre one except on an all-inch setup.
    pub fn safe_z_retract(&self, program_units: Units) -> String {
        let z_max = self.machine.z_max_limit.trim();
        let clearance = self.machine.z_clearance_mm;
        match (self.machine.native_units, program_units) {
            (Units::Millimetre, Units::Millimetre) => {
                format!("G53 G0 Z[{} - {}]", z_max, format_number(clearance))
            }
            (Units::Millimetre, Units::Inch) => format!(
                "G53 G0 Z[[{} - {}] * {}]",
                z_max,
                format_number(clearance),
                format_number(INCHES_PER_MM)
            ),
            (Units::Inch, Units::Millimetre) => format!(
                "G53 G0 Z[[{} * {}] - {}]",
                z_max,
                format_number(MM_PER_INCH),
                format_number(clearance)
            ),
            (Units::Inch, Units::Inch) => format!(
                "G53 G0 Z[{} - {}]",
                z_max,
                format_number(self.machine.z_clearance_inch)
            ),
        }
    }

    /// Build the restart program from the prescan `state` and the `tail`
    /// starting at the restart line.
    pub fn synthesize(
        &self,
        state: &ModalState,
        tail: &[SourceLine],
        lead_in: &LeadInRequest,
    ) -> Synthesis {
        let mut out = Synthesis::default();
        let units = self.program_units(state);

        // 1. parameters
        out.lines.extend(state.params.iter().cloned());

        // 2. modal codes
        if let Some(units) = state.units {
            out.lines.push(units.gcode().to_string());
        }
        if state.cutter_comp_released {
            out.lines.push("G40".to_string());
        }
        if let Some(blend) = &state.path_blend {
            out.lines.push(blend.gcode());
        }
        if let Some(mode) = state.distance_mode {
            out.lines.push(mode.gcode().to_string());
        }
        if let Some(mode) = state.arc_distance_mode {
            out.lines.push(mode.arc_gcode().to_string());
        }

        // 3. resume marker
        out.lines.push(self.restart.resume_marker.clone());

        // 4. torch and THC
        for output in [&state.torch, &state.thc] {
            if let Some(command) = output.command() {
                out.lines.push(command.to_string());
            }
        }

        // 5. velocity override
        if let Some(ovr) = &state.velocity_override {
            if ovr.is_noop() {
                debug!("velocity override `{}` restores nothing, skipped", ovr.command);
            } else {
                out.lines.push(ovr.command.clone());
            }
        }

        // 6. safe Z
        out.lines.push(self.safe_z_retract(units));

        // 7. material
        let folded = self.fold_leading_material(tail);
        let material = folded
            .as_ref()
            .map(|f| &f.selection)
            .or(state.material.as_ref());
        if let Some(material) = material {
            out.lines.push(material.line.clone());
            if material.needs_activation() {
                out.lines.push(self.restart.material_activation.clone());
            }
        }
        let tail = &tail[folded.map_or(0, |f| f.lines)..];

        // 8. feed
        if let Some(feed) = state
            .feed_expression
            .as_ref()
            .or(self.restart.default_feed_expression.as_ref())
        {
            out.lines.push(feed.clone());
        }

        // 9. positioning and spindle start
        let resume = classify_resume(tail, state.last_motion);
        let spindle = state.spindle_command.as_deref();
        let mut deferred_spindle = None;
        match resume.motion {
            ResumeMotion::Rapid => {
                if lead_in.enabled {
                    self.degrade(
                        &mut out,
                        "the first move after the restart line is a rapid".to_string(),
                    );
                }
                deferred_spindle = spindle.zip(resume.first_move);
            }
            ResumeMotion::Feed => self.position(&mut out, state, lead_in, units, spindle),
        }

        // 10. remaining program
        let mut skip_spindle = spindle;
        let mut carried = state.last_motion;
        for (offset, line) in tail.iter().enumerate() {
            let text = line.text.trim();
            if skip_spindle.is_some_and(|s| s == text) {
                debug!("line {}: duplicate spindle start skipped", line.index);
                skip_spindle = None;
                continue;
            }

            let class = classify(line);
            let code = class.code();
            let stops = code.is_some_and(|c| c.directives.contains(&Directive::SpindleStop));
            let moves = code.is_some_and(CodeLine::has_axis_words);

            // step 9 left the controller in G0, so the first move restates its mode
            match (resume.first_move == Some(offset), carried) {
                (true, Some(motion)) if code.is_some_and(CodeLine::starts_with_axis_word) => {
                    out.lines.push(format!("{} {}", motion.gcode(), line.text.trim_start()));
                }
                _ => out.lines.push(line.text.clone()),
            }
            if let Some(motion) = code.and_then(CodeLine::motion) {
                carried = Some(motion);
            }

            // the torch was stopped before the resume move, nothing to restore
            if stops && deferred_spindle.is_some_and(|(_, first)| offset < first) {
                debug!("line {}: spindle stopped before the first move", line.index);
                deferred_spindle = None;
            }
            if let Some((command, first_move)) = deferred_spindle {
                if offset == first_move {
                    out.lines.push(command.to_string());
                }
            }

            // a later start belongs to the next cut
            if stops || moves {
                skip_spindle = None;
            }
        }

        out
    }

    /// Rapid to the resume point, through a lead-in when one is requested
    fn position(
        &self,
        out: &mut Synthesis,
        state: &ModalState,
        lead_in: &LeadInRequest,
        units: Units,
        spindle: Option<&str>,
    ) {
        let target = axis_words(state.last_x.as_deref(), state.last_y.as_deref());

        if lead_in.enabled {
            let request = LeadIn {
                length: lead_in.length,
                angle_degrees: lead_in.angle,
            };
            let scale = self.machine.native_units.scale_to(units);
            match compute_lead_in(state.last_x.as_deref(), state.last_y.as_deref(), &request, scale) {
                Ok(point) => {
                    out.lines.push(format!("G0 X{} Y{}", point.x, point.y));
                    if let Some(spindle) = spindle {
                        out.lines.push(spindle.to_string());
                    }
                    out.lines.push(format!("G1 {}", target));
                    return;
                }
                Err(e) => self.degrade(out, e.to_string()),
            }
        }

        if !target.is_empty() {
            out.lines.push(format!("G0 {}", target));
        }
        if let Some(spindle) = spindle {
            out.lines.push(spindle.to_string());
        }
    }

    fn degrade(&self, out: &mut Synthesis, reason: String) {
        warn!("Lead-in unavailable: {}", reason);
        out.warnings.push(RestartWarning::LeadInUnavailable { reason });
    }

    /// A real material selection (and its activation) opening the tail
    fn fold_leading_material(&self, tail: &[SourceLine]) -> Option<FoldedMaterial> {
        let first = tail.first()?;
        let id = directives(first).into_iter().find_map(|d| match d {
            Directive::MaterialSelect { id } => id.as_deref().and_then(parse_material_id),
            _ => None,
        })?;
        if id >= self.restart.transient_material_threshold {
            debug!("line {}: transient material {} left in place", first.index, id);
            return None;
        }

        let activated = tail
            .get(1)
            .is_some_and(|line| directives(line).contains(&Directive::MaterialActivate));
        Some(FoldedMaterial {
            selection: MaterialSelection {
                line: first.text.trim().to_string(),
                kind: MaterialKind::Numeric(id),
            },
            lines: if activated { 2 } else { 1 },
        })
    }
}

fn directives(line: &SourceLine) -> Vec<Directive> {
    match classify(line) {
        LineClass::Directive(code) | LineClass::Motion(code) => code.directives,
        _ => Vec::new(),
    }
}

fn axis_words(x: Option<&str>, y: Option<&str>) -> String {
    let mut words = Vec::new();
    if let Some(x) = x {
        words.push(format!("X{}", x));
    }
    if let Some(y) = y {
        words.push(format!("Y{}", y));
    }
    words.join(" ")
}
