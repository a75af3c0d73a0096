//! Reasoning composer.
//!
//! Builds the supervision target for one sample:
//!
//! ```text
//! Thoughts:
//!  - Notable Objects from Perception: car at (1.20,8.40)
//!    Potential Effects from Prediction: within the safe zone of the ego-vehicle at the 1.5-second timestep
//! Meta Action: MOVE FORWARD WITH A DECELERATION
//! Trajectory:
//! [(0.01,2.80), (0.02,5.35), (0.03,7.61), (0.04,9.57), (0.05,11.24), (0.06,12.61)]
//! ```
//!
//! Hazards come from the estimated ego path, never from the ground-truth
//! future; the meta action does use the ground truth, since it describes
//! the answer.

use std::fmt::Write as _;

use tracing::debug;

use crate::collision::{first_hit, CollisionHit};
use crate::config::ReasoningConfig;
use crate::encoder::encode_ego_future;
use crate::error::Result;
use crate::kinematics::estimate_ego_path;
use crate::meta_action::{self, MetaAction};
use crate::record::SampleRecord;
use crate::scene::{fmt_point, relevant_agents};

/// What the assistant half of an example contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssistantTarget {
    /// Thoughts, meta action and trajectory.
    #[default]
    Reasoning,
    /// The encoded trajectory alone.
    TrajectoryOnly,
}

/// First hazardous timestep of every relevant agent, in input order.
#[must_use]
pub fn detect_hazards(record: &SampleRecord, config: &ReasoningConfig) -> Vec<CollisionHit> {
    let ego_path = estimate_ego_path(&record.ego);
    relevant_agents(&record.objects, config.perception_range)
        .filter_map(|(i, agent)| {
            first_hit(i, agent, &ego_path, config.ego_footprint, &config.margins)
        })
        .collect()
}

/// The `Thoughts:` block listing notable objects and their effects.
///
/// Objects are always named by their short label, whatever the scene
/// description mode. Hits whose agent index is not in `record` are skipped.
#[must_use]
pub fn thoughts(record: &SampleRecord, hazards: &[CollisionHit]) -> String {
    let notable: Vec<_> = hazards
        .iter()
        .filter_map(|hit| record.objects.get(hit.agent_index).map(|agent| (hit, agent)))
        .collect();
    let mut out = String::from("Thoughts:\n");
    if notable.is_empty() {
        out.push_str(" - Notable Objects from Perception: None\n");
        out.push_str("   Potential Effects from Prediction: None\n");
        return out;
    }
    for (hit, agent) in notable {
        let _ = writeln!(
            out,
            " - Notable Objects from Perception: {} at {}",
            agent.short_name(),
            fmt_point(&agent.position())
        );
        let _ = writeln!(
            out,
            "   Potential Effects from Prediction: \
             within the safe zone of the ego-vehicle at the {:.1}-second timestep",
            hit.seconds()
        );
    }
    out
}

/// Thoughts and meta action, without the trajectory.
///
/// # Errors
///
/// Returns [`crate::ReasoningError::MissingGroundTruth`] for records without a
/// future and [`crate::ReasoningError::InvalidState`] from the classifier.
pub fn chain_of_thoughts(record: &SampleRecord, config: &ReasoningConfig) -> Result<String> {
    let hazards = detect_hazards(record, config);
    let action: MetaAction = meta_action::classify(&record.ego, config)?;
    debug!(token = %record.token, hazards = hazards.len(), %action, "composed reasoning");

    let mut out = thoughts(record, &hazards);
    let _ = writeln!(out, "Meta Action: {action}");
    Ok(out)
}

/// Full assistant message for a ground-truth record.
///
/// # Errors
///
/// Same as [`chain_of_thoughts`]; a trajectory-only target still needs the
/// ground-truth future.
pub fn assistant_message(
    record: &SampleRecord,
    config: &ReasoningConfig,
    target: AssistantTarget,
) -> Result<String> {
    let trajectory = encode_ego_future(&record.ego)?;
    match target {
        AssistantTarget::TrajectoryOnly => Ok(trajectory),
        AssistantTarget::Reasoning => {
            let mut out = chain_of_thoughts(record, config)?;
            out.push_str("Trajectory:\n");
            out.push_str(&trajectory);
            Ok(out)
        }
    }
}
