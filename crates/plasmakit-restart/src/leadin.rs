//! Lead-in geometry
//!
//! Computes an approach point offset from the resume point by
//! `length * (cos(angle), sin(angle))`. Literal coordinates are offset
//! numerically. Parametric coordinates cannot be evaluated until run time,
//! so the offset is wrapped around the original expression instead:
//! `[#5420]` becomes `[[#5420]+0.707107]`.

use crate::expression::{format_number, is_expression};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offsets smaller than this are written as zero
const OFFSET_EPSILON: f64 = 5e-7;

/// Lead-in failure, reported to the operator as a warning
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeadInError {
    /// No resume coordinate is known for the axis
    #[error("no resume coordinate for axis {0}")]
    MissingCoordinate(char),

    /// The coordinate is neither a number nor an expression
    #[error("coordinate `{value}` on axis {axis} is not a number or expression")]
    Unparseable { axis: char, value: String },

    /// Requested length is zero, negative or not a number
    #[error("lead-in length must be positive, got {0}")]
    InvalidLength(f64),

    /// The arithmetic produced a non-finite value
    #[error("lead-in offset on axis {0} is not finite")]
    NonFinite(char),
}

/// Requested lead-in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadIn {
    pub length: f64,
    pub angle_degrees: f64,
}

/// Computed approach point, as coordinate text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadInPoint {
    pub x: String,
    pub y: String,
}

/// Compute the lead-in point for a resume coordinate.
///
/// `scale` converts the lead-in length into program units.
pub fn compute_lead_in(
    x: Option<&str>,
    y: Option<&str>,
    lead_in: &LeadIn,
    scale: f64,
) -> Result<LeadInPoint, LeadInError> {
    let x = x.ok_or(LeadInError::MissingCoordinate('X'))?;
    let y = y.ok_or(LeadInError::MissingCoordinate('Y'))?;
    if lead_in.length.is_nan() || lead_in.length <= 0.0 {
        return Err(LeadInError::InvalidLength(lead_in.length));
    }

    let length = lead_in.length * scale;
    let angle = lead_in.angle_degrees.to_radians();
    let dx = length * angle.cos();
    let dy = length * angle.sin();

    Ok(LeadInPoint {
        x: offset_coordinate('X', x, dx)?,
        y: offset_coordinate('Y', y, dy)?,
    })
}

fn offset_coordinate(axis: char, value: &str, offset: f64) -> Result<String, LeadInError> {
    if !offset.is_finite() {
        return Err(LeadInError::NonFinite(axis));
    }
    let offset = if offset.abs() < OFFSET_EPSILON {
        0.0
    } else {
        offset
    };

    let value = value.trim();
    if is_expression(value) {
        let sign = if offset < 0.0 { '-' } else { '+' };
        return Ok(format!("[{}{}{:.6}]", value, sign, offset.abs()));
    }

    let literal = value
        .parse::<f64>()
        .map_err(|_| LeadInError::Unparseable {
            axis,
            value: value.to_string(),
        })?;
    let moved = literal + offset;
    if !moved.is_finite() {
        return Err(LeadInError::NonFinite(axis));
    }
    Ok(format_number(moved))
}
