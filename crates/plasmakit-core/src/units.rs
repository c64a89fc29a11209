//! Unit system handling
//!
//! Programs select inch or millimetre units with G20/G21 while the machine
//! has its own native units. Values configured in machine units (Z limits,
//! clearances, lead-in lengths entered by the operator) are scaled into the
//! program's working units when the two differ.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Inches per millimetre, as the controller's own conversions write it
pub const INCHES_PER_MM: f64 = 0.03937;

/// Length unit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    /// Millimetres (G21)
    #[serde(rename = "mm", alias = "millimetre", alias = "metric")]
    Millimetre,
    /// Inches (G20)
    #[serde(rename = "inch", alias = "in", alias = "imperial")]
    Inch,
}

impl Default for Units {
    fn default() -> Self {
        Self::Millimetre
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millimetre => write!(f, "mm"),
            Self::Inch => write!(f, "inch"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "metric" | "millimetre" | "millimeter" | "g21" => Ok(Self::Millimetre),
            "in" | "inch" | "imperial" | "g20" => Ok(Self::Inch),
            _ => Err(format!("Unknown unit system: {}", s)),
        }
    }
}

impl Units {
    /// The G-code word that selects this unit system
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Millimetre => "G21",
            Self::Inch => "G20",
        }
    }

    /// Factor that converts a length in `self` into `target` units
    pub fn scale_to(&self, target: Units) -> f64 {
        match (self, target) {
            (Self::Millimetre, Self::Inch) => INCHES_PER_MM,
            (Self::Inch, Self::Millimetre) => MM_PER_INCH,
            _ => 1.0,
        }
    }
}
