//! Prompt text: system templates, the user message and worked examples.
//!
//! The user message is the plain (non-reasoning) description of a sample:
//! the relevant objects, the ego state, the recent history and the mission
//! goal. It is the input half of every fine-tuning example.

use std::fmt::Write as _;

use crate::config::ReasoningConfig;
use crate::error::Result;
use crate::kinematics::EgoKinematics;
use crate::reasoning::{assistant_message, AssistantTarget};
use crate::record::{SampleRecord, HISTORY_POINTS};
use crate::scene::{describe_scene, fmt_point};

/// Fixed system prompt variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemPrompt {
    /// Full context, inputs, task and output description.
    #[default]
    Full,
    /// Output description with the reasoning steps only.
    ChainOfThought,
    /// Trajectory output only.
    TrajectoryOnly,
}

const SYSTEM_FULL: &str = "
**Autonomous Driving Planner**
Role: You are the brain of an autonomous vehicle. Plan a safe 3-second driving trajectory. Avoid collisions with other objects.

Context
- Coordinates: X-axis is perpendicular, and Y-axis is parallel to the direction you're facing. You're at point (0,0).
- Objective: Create a 3-second route using 6 waypoints, one every 0.5 seconds.

Inputs
1. Perception & Prediction: Info about surrounding objects and their predicted movements.
2. Historical Trajectory: Your past 2-second route, given by 4 waypoints.
3. Ego-States: Your current state including velocity, heading angular velocity, can bus data, heading speed, and steering signal.
4. Mission Goal: Goal location for the next 3 seconds.

Task
- Thought Process: Note down critical objects and potential effects from your perceptions and predictions.
- Action Plan: Detail your meta-actions based on your analysis.
- Trajectory Planning: Develop a safe and feasible 3-second route using 6 new waypoints.

Output
- Thoughts:
  - Notable Objects
    Potential Effects
- Meta Action
- Trajectory (MOST IMPORTANT):
  - [(x1,y1), (x2,y2), ... , (x6,y6)]
";

const SYSTEM_COT: &str = "
**Autonomous Driving Planner**
Role: You are the brain of an autonomous vehicle. Plan a safe 3-second driving trajectory. Avoid collisions with other objects.

Output
- Thoughts: identify critical objects and potential effects from perceptions and predictions.
- Meta Action
- Trajectory (MOST IMPORTANT): 6 waypoints, one every 0.5 seconds
  - [(x1,y1), (x2,y2), ... , (x6,y6)]
";

const SYSTEM_SHORT: &str = "
**Autonomous Driving Planner**
Role: You are the brain of an autonomous vehicle. Plan a safe 3-second driving trajectory. Avoid collisions with other objects.

Output
- Trajectory (MOST IMPORTANT): 6 waypoints, one every 0.5 seconds
  - [(x1,y1), (x2,y2), ... , (x6,y6)]
";

impl SystemPrompt {
    /// Template text.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Full => SYSTEM_FULL,
            Self::ChainOfThought => SYSTEM_COT,
            Self::TrajectoryOnly => SYSTEM_SHORT,
        }
    }
}

/// Plain description of a sample used as the user prompt.
#[must_use]
pub fn user_message(record: &SampleRecord, config: &ReasoningConfig) -> String {
    let mut msg = String::from("\n");
    msg.push_str("Perception and Prediction:\n");
    msg.push_str(&describe_scene(&record.objects, config));

    let k = EgoKinematics::from_ego(&record.ego);
    msg.push_str("Ego-States:\n");
    let _ = writeln!(msg, " - Velocity (vx,vy): {}", fmt_point(&k.velocity));
    let _ = writeln!(msg, " - Heading Angular Velocity (v_yaw): ({:.2})", k.yaw_rate);
    let _ = writeln!(msg, " - Acceleration (ax,ay): {}", fmt_point(&k.acceleration));
    let _ = writeln!(msg, " - Can Bus: {}", fmt_point(&k.can_bus));
    let _ = writeln!(msg, " - Heading Speed: ({:.2})", k.heading_speed);
    let _ = writeln!(msg, " - Steering: ({:.2})", k.steering);

    let history: Vec<String> = record
        .ego
        .history_trajectory()
        .iter()
        .take(HISTORY_POINTS)
        .map(fmt_point)
        .collect();
    let _ = writeln!(
        msg,
        "Historical Trajectory (last 2 seconds): [{}]",
        history.join(", ")
    );
    let _ = writeln!(msg, "Mission Goal: {}", record.ego.mission());
    msg
}

/// One worked example: a user block followed by its full reasoning answer.
///
/// # Errors
///
/// Propagates classification errors from the assistant message; worked
/// examples are built from ground-truth records only.
pub fn in_context_example(record: &SampleRecord, config: &ReasoningConfig) -> Result<String> {
    let mut msg = String::from("\nFor example:\n");
    msg.push_str("Input:\n");
    msg.push_str(&user_message(record, config));
    msg.push_str("You should generate the following content:\n");
    msg.push_str(&assistant_message(record, config, AssistantTarget::Reasoning)?);
    Ok(msg)
}
