//! Modal state reconstruction
//!
//! Replays the lines before the restart target through the classifier and
//! folds every recognized directive into one [`ModalState`]. Each directive
//! has a single update rule, applied in line order:
//!
//! | directive | rule |
//! |---|---|
//! | units, path blend, distance modes, motion word | last seen wins |
//! | cutter compensation | last seen wins; engaging marks it seen, `G40` releases it |
//! | torch, THC, velocity override, spindle start | exact line text stored |
//! | material select | real ids stored, transient ids skipped |
//! | feed | stored as `F<value>` |
//! | parameter assignment | appended verbatim |
//! | `o` block markers | push / pop the open block stack |

use crate::classifier::{classify, Directive, LineClass};
use crate::expression::extract_axis;
use crate::outcome::RestartWarning;
use crate::program::SourceLine;
use crate::state::{
    CutterCompensation, MaterialKind, MaterialSelection, ModalState, OutputState,
    SubroutineMarker, VelocityOverride,
};
use tracing::{debug, warn};

/// Parse a material id the way the controller reads `P` words.
///
/// Accepts plain integers and integral decimals (`5`, `5.0`).
pub fn parse_material_id(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Ok(id) = text.parse::<u64>() {
        return Some(id);
    }
    let value = text.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Result of replaying a program prefix
#[derive(Debug, Clone, PartialEq)]
pub struct Prescan {
    pub state: ModalState,
    pub warnings: Vec<RestartWarning>,
}

/// Folds classified lines into a [`ModalState`]
#[derive(Debug, Clone)]
pub struct ModalStateTracker {
    transient_threshold: u64,
    state: ModalState,
    warnings: Vec<RestartWarning>,
}

impl ModalStateTracker {
    /// Create a tracker. Material ids at or above `transient_threshold` are
    /// treated as transient placeholders.
    pub fn new(transient_threshold: u64) -> Self {
        Self {
            transient_threshold,
            state: ModalState::new(),
            warnings: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    /// Replay every line in order
    pub fn replay(&mut self, lines: &[SourceLine]) {
        for line in lines {
            self.apply(line);
        }
    }

    /// Fold one line into the state
    pub fn apply(&mut self, line: &SourceLine) {
        let class = classify(line);
        debug!("line {}: {:?}", line.index, class);

        match class {
            LineClass::Comment { material_label } => {
                if material_label {
                    self.state.material = Some(MaterialSelection {
                        line: line.text.trim().to_string(),
                        kind: MaterialKind::Label,
                    });
                }
            }
            LineClass::ParameterAssignment => self.state.params.push(line.text.clone()),
            LineClass::SubroutineOpen(marker) => self.open_block(marker),
            LineClass::SubroutineClose(marker) => self.close_block(&marker),
            LineClass::Directive(code) => {
                for directive in &code.directives {
                    self.apply_directive(line, directive);
                }
            }
            LineClass::Motion(code) => {
                for directive in &code.directives {
                    self.apply_directive(line, directive);
                }
                if let Some(x) = extract_axis(&line.text, 'x') {
                    self.state.last_x = Some(x);
                }
                if let Some(y) = extract_axis(&line.text, 'y') {
                    self.state.last_y = Some(y);
                }
            }
        }
    }

    /// Finish the replay
    pub fn finish(self) -> Prescan {
        Prescan {
            state: self.state,
            warnings: self.warnings,
        }
    }

    fn open_block(&mut self, marker: SubroutineMarker) {
        // `oN while` after `oN do` closes the do-while loop
        if marker.keyword == "while" {
            if let Some(pos) = self
                .state
                .open_blocks
                .iter()
                .rposition(|b| b.label == marker.label && b.keyword == "do")
            {
                self.state.open_blocks.remove(pos);
                return;
            }
        }
        self.state.open_blocks.push(marker);
    }

    fn close_block(&mut self, marker: &SubroutineMarker) {
        let blocks = &mut self.state.open_blocks;
        match blocks.iter().rposition(|b| b.label == marker.label) {
            Some(pos) => {
                blocks.remove(pos);
            }
            None => {
                if blocks.pop().is_none() {
                    debug!("unmatched block close {}", marker.label);
                }
            }
        }
    }

    fn apply_directive(&mut self, line: &SourceLine, directive: &Directive) {
        let text = line.text.trim();
        let state = &mut self.state;

        match directive {
            Directive::Units(units) => state.units = Some(*units),
            Directive::CutterCompensation(CutterCompensation::Off) => {
                if state.cutter_comp_seen {
                    state.cutter_comp_released = true;
                }
                state.cutter_comp_seen = false;
                state.cutter_compensation = CutterCompensation::Off;
            }
            Directive::CutterCompensation(side) => {
                state.cutter_compensation = *side;
                state.cutter_comp_seen = true;
            }
            Directive::PathBlend(blend) => state.path_blend = Some(blend.clone()),
            Directive::Distance(mode) => state.distance_mode = Some(*mode),
            Directive::ArcDistance(mode) => state.arc_distance_mode = Some(*mode),
            Directive::Motion(kind) => state.last_motion = Some(*kind),
            Directive::Torch { enabled } => state.torch = output_state(*enabled, text),
            Directive::Thc { enabled } => state.thc = output_state(*enabled, text),
            Directive::VelocityOverride { percent } => {
                state.velocity_override = Some(VelocityOverride {
                    command: text.to_string(),
                    percent: percent.as_deref().and_then(|p| p.parse::<f64>().ok()),
                });
            }
            Directive::MaterialSelect { id } => {
                match id.as_deref().and_then(parse_material_id) {
                    Some(id) if id >= self.transient_threshold => {
                        debug!("line {}: transient material {} skipped", line.index, id);
                    }
                    Some(id) => {
                        state.material = Some(MaterialSelection {
                            line: text.to_string(),
                            kind: MaterialKind::Numeric(id),
                        });
                    }
                    None => {
                        warn!("line {}: unreadable material selection `{}`", line.index, text);
                        self.warnings.push(RestartWarning::MaterialParse {
                            line: line.index,
                            text: text.to_string(),
                        });
                    }
                }
            }
            Directive::SpindleStart => state.spindle_command = Some(text.to_string()),
            Directive::SpindleStop => state.spindle_command = None,
            Directive::Feed(value) => state.feed_expression = Some(format!("F{}", value)),
            Directive::MaterialActivate | Directive::BlockFlow(_) => {}
        }
    }
}

fn output_state(enabled: bool, text: &str) -> OutputState {
    let command = text.to_string();
    if enabled {
        OutputState::Enabled { command }
    } else {
        OutputState::Disabled { command }
    }
}

/// Replay `lines` and return the reconstructed state
pub fn prescan(lines: &[SourceLine], transient_threshold: u64) -> Prescan {
    let mut tracker = ModalStateTracker::new(transient_threshold);
    tracker.replay(lines);
    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::SourceProgram;
    use crate::state::{DistanceMode, MotionKind, PathBlend};
    use plasmakit_core::Units;

    const THRESHOLD: u64 = 1_000_000;

    fn scan(text: &str) -> Prescan {
        let program = SourceProgram::from_text(text);
        prescan(program.lines(), THRESHOLD)
    }

    #[test]
    fn test_parse_material_id() {
        assert_eq!(parse_material_id("5"), Some(5));
        assert_eq!(parse_material_id("12.0"), Some(12));
        assert_eq!(parse_material_id("1.5"), None);
        assert_eq!(parse_material_id("#<mat>"), None);
        assert_eq!(parse_material_id("-3"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let state = scan("G20\nG90 G91.1\nG21\nG61\nG64 P0.2\nG91\n").state;
        assert_eq!(state.units, Some(Units::Millimetre));
        assert_eq!(state.distance_mode, Some(DistanceMode::Incremental));
        assert_eq!(state.arc_distance_mode, Some(DistanceMode::Incremental));
        assert_eq!(
            state.path_blend,
            Some(PathBlend::Blend {
                tolerance: Some("0.2".to_string()),
                naive_cam: None,
            })
        );
    }

    #[test]
    fn test_axes_update_independently() {
        let state = scan("G0 X5 Y6\nG1 X[#1+2]\n").state;
        assert_eq!(state.last_x.as_deref(), Some("[#1+2]"));
        assert_eq!(state.last_y.as_deref(), Some("6"));
    }

    #[test]
    fn test_continuation_keeps_motion() {
        let state = scan("G2 X1 Y1 I1 J0\nX2 Y2\n").state;
        assert_eq!(state.last_motion, Some(MotionKind::ArcCw));
        assert_eq!(state.last_x.as_deref(), Some("2"));
    }

    #[test]
    fn test_positions_come_from_axis_lines() {
        let state = scan("G0 X1 Y1\nG10 L20 P1 X0\n").state;
        // G10 lines carry axis words so they count as motion lines
        assert_eq!(state.last_x.as_deref(), Some("0"));
        let state = scan("G0 X1 Y1\n(X9 Y9)\n#1 = 3\n").state;
        assert_eq!(state.last_x.as_deref(), Some("1"));
    }

    #[test]
    fn test_compensation_lifecycle() {
        let state = scan("G41.1 D1\n").state;
        assert!(state.compensation_engaged());
        assert!(!state.cutter_comp_released);

        let state = scan("G42 D1\nG1 X1\nG40\n").state;
        assert!(!state.compensation_engaged());
        assert!(state.cutter_comp_released);

        let state = scan("G40\n").state;
        assert!(!state.cutter_comp_released);
    }

    #[test]
    fn test_outputs_keep_exact_text() {
        let state = scan("M62 P3 (torch off)\nm65p2\nM67 E3 Q60\n").state;
        assert_eq!(
            state.torch,
            OutputState::Disabled {
                command: "M62 P3 (torch off)".to_string()
            }
        );
        assert_eq!(
            state.thc,
            OutputState::Enabled {
                command: "m65p2".to_string()
            }
        );
        let ovr = state.velocity_override.unwrap();
        assert_eq!(ovr.command, "M67 E3 Q60");
        assert_eq!(ovr.percent, Some(60.0));
    }

    #[test]
    fn test_transient_material_does_not_clobber() {
        let prescan = scan("M190 P4\nM66 P3 L3 Q1\nM190 P1000000\n");
        let material = prescan.state.material.unwrap();
        assert_eq!(material.line, "M190 P4");
        assert_eq!(material.kind, MaterialKind::Numeric(4));
        assert!(prescan.warnings.is_empty());
    }

    #[test]
    fn test_material_label() {
        let state = scan("M190 P4\n(o=0, kw=1.2, ph=3)\n").state;
        let material = state.material.unwrap();
        assert_eq!(material.kind, MaterialKind::Label);
        assert!(!material.needs_activation());
    }

    #[test]
    fn test_unreadable_material_warns() {
        let prescan = scan("M190 P4\nM190 P#<mat>\n");
        assert_eq!(prescan.state.material.unwrap().line, "M190 P4");
        assert_eq!(
            prescan.warnings,
            vec![RestartWarning::MaterialParse {
                line: 1,
                text: "M190 P#<mat>".to_string()
            }]
        );
    }

    #[test]
    fn test_spindle_and_feed() {
        let state = scan("F#<_hal[plasmac.cut-feed-rate]>\nM3 $0 S1\n").state;
        assert_eq!(
            state.feed_expression.as_deref(),
            Some("F#<_hal[plasmac.cut-feed-rate]>")
        );
        assert_eq!(state.spindle_command.as_deref(), Some("M3 $0 S1"));

        let state = scan("M3 $0 S1\nG1 X1 F900\nM5 $0\n").state;
        assert_eq!(state.spindle_command, None);
        assert_eq!(state.feed_expression.as_deref(), Some("F900"));
    }

    #[test]
    fn test_params_verbatim_in_order() {
        let state = scan("#<b> = 2\n  #1=[#<b>*2]\nG0 X1\n#<b> = 2\n").state;
        assert_eq!(state.params, vec!["#<b> = 2", "  #1=[#<b>*2]", "#<b> = 2"]);
    }

    #[test]
    fn test_block_nesting() {
        let state = scan("o100 sub\no101 if [#1 GT 0]\no101 endif\n").state;
        assert_eq!(state.subroutine_depth(), 1);
        assert_eq!(state.open_blocks[0].label, "o100");

        let state = scan("o100 sub\no100 endsub\no100 call\n").state;
        assert_eq!(state.subroutine_depth(), 0);

        let state = scan("o5 do\nG1 X1\no5 while [#1 LT 3]\n").state;
        assert_eq!(state.subroutine_depth(), 0);

        let state = scan("o7 endsub\no7 endsub\n").state;
        assert_eq!(state.subroutine_depth(), 0);
    }
}
