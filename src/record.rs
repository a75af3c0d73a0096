//! Sample record data structures.
//!
//! A [`SampleRecord`] is one driving scene at one timestamp: the perceived
//! agents with their predicted futures and the ego vehicle's kinematic
//! snapshot. Records are immutable once built; shapes are checked when they
//! are constructed (see [`crate::validation`]), so downstream code indexes
//! without bounds surprises.
//!
//! # Ego feature layout (`lcf_feat`)
//!
//! | Index | Meaning | Scaling |
//! |-------|---------|---------|
//! | 0, 1 | velocity (vx, vy) | x0.5 to m per 0.5 s |
//! | 2, 3 | can bus (cx, cy) | as is |
//! | 4 | heading angular velocity | as is |
//! | 5, 6 | ego length, width | unused |
//! | 7 | heading speed | x0.5 to m per 0.5 s |
//! | 8 | steering | as is |

use std::collections::HashMap;
use std::fmt;

use crate::collision::Footprint;
use crate::error::{ReasoningError, Result};
use crate::math::{cumulative_sum, translate, Point2};

/// Number of predicted future steps (0.5 s apart).
pub const FUTURE_STEPS: usize = 6;

/// Number of timesteps including the current one.
pub const HORIZON: usize = FUTURE_STEPS + 1;

/// Number of history positions shown in the prompt.
pub const HISTORY_POINTS: usize = 4;

/// Minimum number of history step differences (for acceleration).
pub const MIN_HISTORY_DIFFS: usize = 2;

/// Length of the ego local feature vector.
pub const LCF_FEAT_LEN: usize = 9;

/// Scene samples keyed by their token.
pub type SampleStore = HashMap<String, SampleRecord>;

/// One perceived object.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Dotted category label, e.g. `vehicle.car`.
    pub name: String,

    /// Raw box `[x, y, z, w, l, h, yaw]`.
    pub bbox: [f64; 7],

    /// Per-step displacements of the predicted future.
    pub rel_future_offsets: [Point2; FUTURE_STEPS],

    /// Whether each future step is observed.
    pub future_valid: [bool; FUTURE_STEPS],
}

impl Agent {
    /// Current position in the ego frame.
    #[must_use]
    pub fn position(&self) -> Point2 {
        Point2::new(self.bbox[0], self.bbox[1])
    }

    /// Last segment of the taxonomy label (`vehicle.car` -> `car`).
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Absolute future positions for steps 1..=6.
    #[must_use]
    pub fn future_positions(&self) -> Vec<Point2> {
        translate(&cumulative_sum(&self.rel_future_offsets), self.position())
    }

    /// Current position followed by the six future positions.
    #[must_use]
    pub fn path(&self) -> Vec<Point2> {
        let mut path = Vec::with_capacity(HORIZON);
        path.push(self.position());
        path.extend(self.future_positions());
        path
    }

    /// Whether timestep `t` (0 = now) is usable; step 0 is always valid.
    #[must_use]
    pub fn is_step_valid(&self, t: usize) -> bool {
        match t {
            0 => true,
            t => self.future_valid.get(t - 1).copied().unwrap_or(false),
        }
    }

    /// Footprint of this agent centered at `center`.
    #[must_use]
    pub fn footprint_at(&self, center: Point2) -> Footprint {
        Footprint {
            center,
            half_width: self.bbox[3] * 0.5,
            half_length: self.bbox[4] * 0.5,
        }
    }
}

/// High-level routing command for the next three seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionCommand {
    Right,
    Left,
    Forward,
}

impl MissionCommand {
    /// Decode the `(right, left, forward)` one-hot triple.
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningError::DataInvariant`] unless exactly one
    /// component is positive.
    pub fn from_one_hot(cmd: [f64; 3]) -> Result<Self> {
        let positive: Vec<usize> = cmd
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(|(i, _)| i)
            .collect();
        match positive.as_slice() {
            [0] => Ok(Self::Right),
            [1] => Ok(Self::Left),
            [2] => Ok(Self::Forward),
            _ => Err(ReasoningError::data_invariant(format!(
                "mission command must have exactly one positive entry, got {cmd:?}"
            ))),
        }
    }

    /// Prompt text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Right => "RIGHT",
            Self::Left => "LEFT",
            Self::Forward => "FORWARD",
        }
    }
}

impl fmt::Display for MissionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ego vehicle kinematic snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EgoState {
    lcf_feat: [f64; LCF_FEAT_LEN],
    history_trajectory: Vec<Point2>,
    history_diff: Vec<Point2>,
    future_trajectory: Option<[Point2; HORIZON]>,
    future_diff: Option<Vec<Point2>>,
    mission: MissionCommand,
}

impl EgoState {
    /// Build an ego state, checking history lengths.
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningError::DataInvariant`] when the history has fewer
    /// than [`HISTORY_POINTS`] positions or fewer than [`MIN_HISTORY_DIFFS`]
    /// differences, or when a future diff is present but empty.
    pub fn new(
        lcf_feat: [f64; LCF_FEAT_LEN],
        history_trajectory: Vec<Point2>,
        history_diff: Vec<Point2>,
        future_trajectory: Option<[Point2; HORIZON]>,
        future_diff: Option<Vec<Point2>>,
        mission: MissionCommand,
    ) -> Result<Self> {
        if history_trajectory.len() < HISTORY_POINTS {
            return Err(ReasoningError::data_invariant(format!(
                "history trajectory needs at least {HISTORY_POINTS} points, got {}",
                history_trajectory.len()
            )));
        }
        if history_diff.len() < MIN_HISTORY_DIFFS {
            return Err(ReasoningError::data_invariant(format!(
                "history diff needs at least {MIN_HISTORY_DIFFS} rows, got {}",
                history_diff.len()
            )));
        }
        if future_diff.as_ref().is_some_and(Vec::is_empty) {
            return Err(ReasoningError::data_invariant("future diff is empty"));
        }
        Ok(Self {
            lcf_feat,
            history_trajectory,
            history_diff,
            future_trajectory,
            future_diff,
            mission,
        })
    }

    /// Raw local feature vector.
    #[must_use]
    pub const fn lcf_feat(&self) -> &[f64; LCF_FEAT_LEN] {
        &self.lcf_feat
    }

    /// Past absolute positions, most recent last.
    #[must_use]
    pub fn history_trajectory(&self) -> &[Point2] {
        &self.history_trajectory
    }

    /// Past step differences, most recent last.
    #[must_use]
    pub fn history_diff(&self) -> &[Point2] {
        &self.history_diff
    }

    /// Ground-truth future positions, index 0 being the current position.
    #[must_use]
    pub const fn future_trajectory(&self) -> Option<&[Point2; HORIZON]> {
        self.future_trajectory.as_ref()
    }

    /// Ground-truth future step differences.
    #[must_use]
    pub fn future_diff(&self) -> Option<&[Point2]> {
        self.future_diff.as_deref()
    }

    /// Routing command.
    #[must_use]
    pub const fn mission(&self) -> MissionCommand {
        self.mission
    }

    /// Ground-truth future, or an error naming the missing field.
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningError::MissingGroundTruth`] for inference-only records.
    pub fn require_future_trajectory(&self) -> Result<&[Point2; HORIZON]> {
        self.future_trajectory
            .as_ref()
            .ok_or(ReasoningError::missing_ground_truth("gt_ego_fut_trajs"))
    }

    /// Ground-truth future diffs, or an error naming the missing field.
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningError::MissingGroundTruth`] for inference-only records.
    pub fn require_future_diff(&self) -> Result<&[Point2]> {
        self.future_diff
            .as_deref()
            .ok_or(ReasoningError::missing_ground_truth("gt_ego_fut_diff"))
    }
}

/// One driving scene at one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Opaque sample identifier.
    pub token: String,

    /// Perceived objects in input order.
    pub objects: Vec<Agent>,

    /// Ego vehicle state.
    pub ego: EgoState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn agent(name: &str, bbox: [f64; 7], step: Point2) -> Agent {
        Agent {
            name: name.to_string(),
            bbox,
            rel_future_offsets: [step; FUTURE_STEPS],
            future_valid: [true; FUTURE_STEPS],
        }
    }

    #[test]
    fn test_short_name() {
        let a = agent("vehicle.car", [0.0; 7], Point2::zeros());
        assert_eq!(a.short_name(), "car");

        let b = agent("barrier", [0.0; 7], Point2::zeros());
        assert_eq!(b.short_name(), "barrier");
    }

    #[test]
    fn test_future_positions() {
        let a = agent(
            "human.pedestrian.adult",
            [1.0, 2.0, 0.0, 0.6, 0.8, 1.7, 0.0],
            Point2::new(0.5, 1.0),
        );
        let future = a.future_positions();
        assert_eq!(future.len(), FUTURE_STEPS);
        assert_relative_eq!(future[0], Point2::new(1.5, 3.0));
        assert_relative_eq!(future[5], Point2::new(4.0, 8.0));

        let path = a.path();
        assert_eq!(path.len(), HORIZON);
        assert_relative_eq!(path[0], Point2::new(1.0, 2.0));
    }

    #[test]
    fn test_step_validity() {
        let mut a = agent("vehicle.truck", [0.0; 7], Point2::zeros());
        a.future_valid[2] = false;
        assert!(a.is_step_valid(0));
        assert!(a.is_step_valid(1));
        assert!(!a.is_step_valid(3));
        assert!(!a.is_step_valid(7));
    }

    #[test]
    fn test_footprint_half_extents() {
        let a = agent("vehicle.car", [0.0, 0.0, 0.0, 2.0, 4.5, 1.5, 0.0], Point2::zeros());
        let fp = a.footprint_at(Point2::new(1.0, 1.0));
        assert_relative_eq!(fp.half_width, 1.0);
        assert_relative_eq!(fp.half_length, 2.25);
    }

    #[test]
    fn test_mission_command() {
        assert_eq!(
            MissionCommand::from_one_hot([1.0, 0.0, 0.0]).unwrap(),
            MissionCommand::Right
        );
        assert_eq!(
            MissionCommand::from_one_hot([0.0, 1.0, 0.0]).unwrap(),
            MissionCommand::Left
        );
        assert_eq!(
            MissionCommand::from_one_hot([0.0, 0.0, 1.0]).unwrap().to_string(),
            "FORWARD"
        );
        assert!(MissionCommand::from_one_hot([0.0, 0.0, 0.0]).is_err());
        assert!(MissionCommand::from_one_hot([1.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_ego_state_history_checks() {
        let lcf = [0.0; LCF_FEAT_LEN];
        let short_history = vec![Point2::zeros(); 3];
        let diffs = vec![Point2::zeros(); 4];
        assert!(EgoState::new(
            lcf,
            short_history,
            diffs.clone(),
            None,
            None,
            MissionCommand::Forward
        )
        .is_err());

        let ego = EgoState::new(
            lcf,
            vec![Point2::zeros(); 5],
            diffs,
            None,
            None,
            MissionCommand::Forward,
        )
        .unwrap();
        assert!(ego.future_trajectory().is_none());
        assert!(matches!(
            ego.require_future_trajectory(),
            Err(ReasoningError::MissingGroundTruth { .. })
        ));
    }
}
