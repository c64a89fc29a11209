//! Modal state reconstructed from a program prefix
//!
//! Tracks every setting that persists across lines and matters when a cut
//! is resumed part way through a program:
//! - Units (G20, G21)
//! - Cutter compensation (G40, G41, G42, G41.1, G42.1)
//! - Path control (G61, G61.1, G64)
//! - Distance modes (G90, G91) and arc distance modes (G90.1, G91.1)
//! - Last motion word and last X/Y position
//! - Torch and THC enable state, velocity override, material, torch start
//! - Feed rate, parameter assignments and subroutine nesting

use plasmakit_core::Units;
use serde::{Deserialize, Serialize};

/// Cutter compensation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutterCompensation {
    /// G40
    #[default]
    Off,
    /// G41 / G41.1
    Left,
    /// G42 / G42.1
    Right,
}

/// Path control mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathBlend {
    /// G61.1
    ExactStop,
    /// G61
    ExactPath,
    /// G64 with optional P tolerance and Q naive-cam tolerance
    Blend {
        tolerance: Option<String>,
        naive_cam: Option<String>,
    },
}

impl PathBlend {
    /// G-code text that restores this mode
    pub fn gcode(&self) -> String {
        match self {
            Self::ExactStop => "G61.1".to_string(),
            Self::ExactPath => "G61".to_string(),
            Self::Blend {
                tolerance,
                naive_cam,
            } => {
                let mut code = "G64".to_string();
                if let Some(p) = tolerance {
                    code.push_str(&format!(" P{}", p));
                }
                if let Some(q) = naive_cam {
                    code.push_str(&format!(" Q{}", q));
                }
                code
            }
        }
    }
}

/// Absolute or incremental distance mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMode {
    Absolute,
    Incremental,
}

impl DistanceMode {
    /// G-code word for linear distance mode
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Absolute => "G90",
            Self::Incremental => "G91",
        }
    }

    /// G-code word for arc centre distance mode
    pub fn arc_gcode(&self) -> &'static str {
        match self {
            Self::Absolute => "G90.1",
            Self::Incremental => "G91.1",
        }
    }
}

/// Motion word (group 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionKind {
    /// G0
    Rapid,
    /// G1
    Linear,
    /// G2
    ArcCw,
    /// G3
    ArcCcw,
}

impl MotionKind {
    /// G-code word for this motion
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Rapid => "G0",
            Self::Linear => "G1",
            Self::ArcCw => "G2",
            Self::ArcCcw => "G3",
        }
    }

    /// Whether this is an uncontrolled rapid move
    pub fn is_rapid(&self) -> bool {
        matches!(self, Self::Rapid)
    }
}

/// Enable state of a digital output, with the command that restores it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputState {
    #[default]
    Unspecified,
    Disabled { command: String },
    Enabled { command: String },
}

impl OutputState {
    /// The exact command line that restores this state
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Unspecified => None,
            Self::Disabled { command } | Self::Enabled { command } => Some(command),
        }
    }
}

/// Velocity override command seen in the program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityOverride {
    /// Exact command line
    pub command: String,
    /// Requested percentage when the Q word is a literal
    pub percent: Option<f64>,
}

impl VelocityOverride {
    /// Whether restoring this override would change nothing.
    ///
    /// Both 0 and 100 select full velocity on this controller.
    pub fn is_noop(&self) -> bool {
        matches!(self.percent, Some(p) if p == 0.0 || p == 100.0)
    }
}

/// How a material was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    /// `M190 P<n>` with a real material number
    Numeric(u64),
    /// Inline `(o=...)` material definition
    Label,
}

/// Material selection line seen in the program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSelection {
    /// Exact line text
    pub line: String,
    pub kind: MaterialKind,
}

impl MaterialSelection {
    /// Whether an activation directive must follow this selection
    pub fn needs_activation(&self) -> bool {
        matches!(self.kind, MaterialKind::Numeric(_))
    }
}

/// An `o` word block marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubroutineMarker {
    /// Block label such as `o100` or `o<cut_hole>`
    pub label: String,
    /// Keyword following the label (`sub`, `endsub`, `if`, ...)
    pub keyword: String,
}

/// Accumulated modal state at the restart line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModalState {
    pub units: Option<Units>,
    pub cutter_compensation: CutterCompensation,
    /// Compensation was engaged and not turned off again
    pub cutter_comp_seen: bool,
    /// Compensation was engaged earlier and later turned off
    pub cutter_comp_released: bool,
    pub path_blend: Option<PathBlend>,
    pub distance_mode: Option<DistanceMode>,
    pub arc_distance_mode: Option<DistanceMode>,
    pub last_motion: Option<MotionKind>,
    pub last_x: Option<String>,
    pub last_y: Option<String>,
    pub torch: OutputState,
    pub thc: OutputState,
    pub velocity_override: Option<VelocityOverride>,
    pub material: Option<MaterialSelection>,
    pub spindle_command: Option<String>,
    pub feed_expression: Option<String>,
    /// Parameter assignment lines in program order
    pub params: Vec<String>,
    /// Blocks opened and not yet closed, outermost first
    pub open_blocks: Vec<SubroutineMarker>,
}

impl ModalState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `o` block nesting depth
    pub fn subroutine_depth(&self) -> usize {
        self.open_blocks.len()
    }

    /// Whether compensation is engaged right now or was never disengaged
    pub fn compensation_engaged(&self) -> bool {
        self.cutter_compensation != CutterCompensation::Off || self.cutter_comp_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_blend_gcode() {
        assert_eq!(PathBlend::ExactStop.gcode(), "G61.1");
        assert_eq!(PathBlend::ExactPath.gcode(), "G61");
        let blend = PathBlend::Blend {
            tolerance: Some("0.1".to_string()),
            naive_cam: Some("0.05".to_string()),
        };
        assert_eq!(blend.gcode(), "G64 P0.1 Q0.05");
        let bare = PathBlend::Blend {
            tolerance: None,
            naive_cam: None,
        };
        assert_eq!(bare.gcode(), "G64");
    }

    #[test]
    fn test_velocity_noop() {
        let mut ovr = VelocityOverride {
            command: "M67 E3 Q0".to_string(),
            percent: Some(0.0),
        };
        assert!(ovr.is_noop());
        ovr.percent = Some(100.0);
        assert!(ovr.is_noop());
        ovr.percent = Some(60.0);
        assert!(!ovr.is_noop());
        ovr.percent = None;
        assert!(!ovr.is_noop());
    }

    #[test]
    fn test_empty_state() {
        let state = ModalState::new();
        assert_eq!(state.subroutine_depth(), 0);
        assert!(!state.compensation_engaged());
        assert_eq!(state.torch.command(), None);
    }
}
