//! Forward-proximity hazard check between the ego and other agents.
//!
//! This is a simplified axis-aligned heuristic, not an oriented box
//! intersection: an agent is a hazard when it is laterally close, strictly
//! ahead, and within a forward gap of the ego footprint.

use tracing::debug;

use crate::math::Point2;
use crate::record::{Agent, HORIZON};

/// Axis-aligned footprint in the ego frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Center position.
    pub center: Point2,
    /// Half extent along X (lateral).
    pub half_width: f64,
    /// Half extent along Y (forward).
    pub half_length: f64,
}

impl Footprint {
    /// Ego footprint at the origin.
    ///
    /// Values are kept exactly as the planner data was generated with.
    pub const EGO: Self = Self {
        center: Point2::new(0.0, 0.0),
        half_width: 0.925,
        half_length: 2.04,
    };

    /// Same extents, moved to `center`.
    #[must_use]
    pub const fn at(self, center: Point2) -> Self {
        Self { center, ..self }
    }
}

/// Safety margins added on top of the two footprints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionMargins {
    /// Extra lateral clearance (m).
    pub lateral: f64,
    /// Extra forward clearance (m).
    pub forward: f64,
}

impl Default for CollisionMargins {
    fn default() -> Self {
        Self {
            lateral: 1.0,
            forward: 3.0,
        }
    }
}

/// Whether `object` is inside the forward safety zone of `ego`.
///
/// Pure function of relative geometry; NaN inputs yield `false`.
#[must_use]
pub fn detect(ego: &Footprint, object: &Footprint, margins: &CollisionMargins) -> bool {
    let dx = (ego.center.x - object.center.x).abs();
    let dy = object.center.y - ego.center.y;
    dx < ego.half_width + object.half_width + margins.lateral
        && dy > 0.0
        && dy < ego.half_length + object.half_length + margins.forward
}

/// First hazardous timestep of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionHit {
    /// Index of the agent in the record.
    pub agent_index: usize,
    /// Timestep (0 = now, 0.5 s cadence).
    pub step: usize,
}

impl CollisionHit {
    /// Time of the hit in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.step as f64 * 0.5
    }
}

/// Scan one agent's timeline against the estimated ego path.
///
/// Steps whose future is unobserved are skipped. Scanning stops at the
/// first hazardous step.
#[must_use]
pub fn first_hit(
    agent_index: usize,
    agent: &Agent,
    ego_path: &[Point2],
    ego: Footprint,
    margins: &CollisionMargins,
) -> Option<CollisionHit> {
    let path = agent.path();
    (0..HORIZON.min(ego_path.len()))
        .filter(|&t| agent.is_step_valid(t))
        .find(|&t| {
            detect(
                &ego.at(ego_path[t]),
                &agent.footprint_at(path[t]),
                margins,
            )
        })
        .map(|step| {
            debug!(agent = agent_index, name = %agent.name, step, "agent inside ego safety zone");
            CollisionHit { agent_index, step }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FUTURE_STEPS;

    fn object(x: f64, y: f64) -> Footprint {
        Footprint {
            center: Point2::new(x, y),
            half_width: 1.0,
            half_length: 2.0,
        }
    }

    #[test]
    fn test_object_ahead_is_detected() {
        let margins = CollisionMargins::default();
        assert!(detect(&Footprint::EGO, &object(0.0, 5.0), &margins));
    }

    #[test]
    fn test_object_behind_is_ignored() {
        let margins = CollisionMargins::default();
        assert!(!detect(&Footprint::EGO, &object(0.0, -1.0), &margins));
        assert!(!detect(&Footprint::EGO, &object(0.0, 0.0), &margins));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let margins = CollisionMargins::default();
        // lateral threshold: 0.925 + 1.0 + 1.0
        assert!(!detect(&Footprint::EGO, &object(2.93, 1.0), &margins));
        assert!(detect(&Footprint::EGO, &object(2.9, 1.0), &margins));
        // forward threshold: 2.04 + 2.0 + 3.0
        assert!(!detect(&Footprint::EGO, &object(0.0, 7.05), &margins));
        assert!(detect(&Footprint::EGO, &object(0.0, 7.0), &margins));
    }

    #[test]
    fn test_nan_is_not_a_hit() {
        let margins = CollisionMargins::default();
        assert!(!detect(&Footprint::EGO, &object(f64::NAN, 1.0), &margins));
    }

    #[test]
    fn test_first_hit_skips_invalid_steps() {
        let agent = Agent {
            name: "vehicle.car".to_string(),
            bbox: [0.0, 30.0, 0.0, 2.0, 4.0, 1.5, 0.0],
            rel_future_offsets: [Point2::new(0.0, -5.0); FUTURE_STEPS],
            future_valid: [true, true, true, false, true, true],
        };
        let ego_path = vec![Point2::zeros(); HORIZON];
        // y positions: 30, 25, 20, 15, 10, 5, 0; step 5 (y = 5) is the first in range
        let hit = first_hit(3, &agent, &ego_path, Footprint::EGO, &CollisionMargins::default());
        assert_eq!(
            hit,
            Some(CollisionHit {
                agent_index: 3,
                step: 5
            })
        );
        assert!((hit.unwrap().seconds() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_first_hit_none() {
        let agent = Agent {
            name: "vehicle.car".to_string(),
            bbox: [10.0, 5.0, 0.0, 2.0, 4.0, 1.5, 0.0],
            rel_future_offsets: [Point2::zeros(); FUTURE_STEPS],
            future_valid: [true; FUTURE_STEPS],
        };
        let ego_path = vec![Point2::zeros(); HORIZON];
        let margins = CollisionMargins::default();
        assert!(first_hit(0, &agent, &ego_path, Footprint::EGO, &margins).is_none());
    }
}
