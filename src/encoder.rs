//! Trajectory text encoding.
//!
//! Waypoints are written as `[(x1,y1), (x2,y2), ..., (x6,y6)]` with every
//! coordinate fixed to two decimals. The planner is asked to answer in the
//! same format, and [`crate::decoder`] reads it back.

use crate::error::Result;
use crate::math::Point2;
use crate::record::EgoState;
use crate::scene::fmt_point;

/// Encode waypoints as a bracketed list of `(x,y)` pairs.
///
/// # Example
///
/// ```
/// use drive_reasoning::{encode_trajectory, Point2};
///
/// let text = encode_trajectory(&[Point2::new(0.0, 2.5), Point2::new(-0.126, 5.0)]);
/// assert_eq!(text, "[(0.00,2.50), (-0.13,5.00)]");
/// ```
#[must_use]
pub fn encode_trajectory(points: &[Point2]) -> String {
    let pairs: Vec<String> = points.iter().map(fmt_point).collect();
    format!("[{}]", pairs.join(", "))
}

/// Encode the six ground-truth target waypoints of an ego state.
///
/// Index 0 of the stored future is the current position and is skipped.
///
/// # Errors
///
/// Returns [`crate::ReasoningError::MissingGroundTruth`] when the record has
/// no future trajectory.
pub fn encode_ego_future(ego: &EgoState) -> Result<String> {
    let future = ego.require_future_trajectory()?;
    Ok(encode_trajectory(&future[1..]))
}
