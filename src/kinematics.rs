//! Ego kinematics and short-horizon path estimation.
//!
//! The estimated path extrapolates the current velocity under a constant
//! acceleration taken from the last two history differences. It never looks
//! at the ground-truth future, so the reasoning built on top of it cannot
//! leak the answer it is meant to justify.

use crate::math::{cumulative_sum, Point2};
use crate::record::{EgoState, HORIZON};

/// Scale from stored velocity units to meters per 0.5 s.
pub const VELOCITY_SCALE: f64 = 0.5;

/// Instantaneous ego kinematics as presented in the prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoKinematics {
    /// Velocity (m per 0.5 s).
    pub velocity: Point2,
    /// Change of the last history step difference.
    pub acceleration: Point2,
    /// Heading angular velocity (rad/s).
    pub yaw_rate: f64,
    /// Can bus reading.
    pub can_bus: Point2,
    /// Heading speed (m per 0.5 s).
    pub heading_speed: f64,
    /// Steering signal.
    pub steering: f64,
}

impl EgoKinematics {
    /// Extract kinematics from an ego state.
    #[must_use]
    pub fn from_ego(ego: &EgoState) -> Self {
        let feat = ego.lcf_feat();
        Self {
            velocity: Point2::new(feat[0] * VELOCITY_SCALE, feat[1] * VELOCITY_SCALE),
            acceleration: history_acceleration(ego.history_diff()),
            yaw_rate: feat[4],
            can_bus: Point2::new(feat[2], feat[3]),
            heading_speed: feat[7] * VELOCITY_SCALE,
            steering: feat[8],
        }
    }

    /// Estimated positions for t = 0..=6 (0.5 s cadence), starting at the origin.
    ///
    /// Velocity at step k >= 1 is `v + (k - 1) * a`; step 0 is at rest.
    #[must_use]
    pub fn estimate_path(&self) -> Vec<Point2> {
        let velocities: Vec<Point2> = (0..HORIZON)
            .map(|k| {
                if k == 0 {
                    Point2::zeros()
                } else {
                    self.velocity + self.acceleration * (k - 1) as f64
                }
            })
            .collect();
        cumulative_sum(&velocities)
    }
}

/// Difference between the last two history step differences.
///
/// Returns zero when fewer than two rows are available; validated records
/// always carry at least two.
#[must_use]
pub fn history_acceleration(history_diff: &[Point2]) -> Point2 {
    match history_diff {
        [.., prev, last] => last - prev,
        _ => Point2::zeros(),
    }
}

/// Estimated 7-point ego path for collision checking.
#[must_use]
pub fn estimate_ego_path(ego: &EgoState) -> Vec<Point2> {
    EgoKinematics::from_ego(ego).estimate_path()
}
