//! Scene description: which objects matter and how they are written down.
//!
//! An agent is dropped when it stays behind the ego for its whole path, or
//! when any of its positions leaves the perception range. The range filter
//! bounds prompt size by policy; it is not a token budget.

use tracing::debug;

use crate::config::{DescriptionMode, ReasoningConfig};
use crate::math::Point2;
use crate::record::Agent;

/// Marker for a future step with no valid prediction.
pub const UNKNOWN_STEP: &str = "(UN,UN)";

/// Why an agent was left out of the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Every position (current and future) has Y <= 0.
    AlwaysBehind,
    /// Some coordinate exceeds the perception range.
    OutOfRange,
}

/// Decide whether an agent is described, returning why not if it is dropped.
#[must_use]
pub fn exclusion(agent: &Agent, perception_range: f64) -> Option<Exclusion> {
    let path = agent.path();
    if path.iter().all(|p| p.y <= 0.0) {
        return Some(Exclusion::AlwaysBehind);
    }
    if path
        .iter()
        .any(|p| p.x.abs() > perception_range || p.y.abs() > perception_range)
    {
        return Some(Exclusion::OutOfRange);
    }
    None
}

/// Whether an agent passes the relevance filter.
#[must_use]
pub fn is_relevant(agent: &Agent, perception_range: f64) -> bool {
    exclusion(agent, perception_range).is_none()
}

/// Agents passing the relevance filter, with their original indices.
pub fn relevant_agents(
    objects: &[Agent],
    perception_range: f64,
) -> impl Iterator<Item = (usize, &Agent)> {
    objects
        .iter()
        .enumerate()
        .filter(move |(i, agent)| match exclusion(agent, perception_range) {
            Some(reason) => {
                debug!(agent = *i, name = %agent.name, ?reason, "agent excluded from scene");
                false
            }
            None => true,
        })
}

/// Format a point as `(x,y)` with two decimals.
#[must_use]
pub fn fmt_point(p: &Point2) -> String {
    format!("({:.2},{:.2})", p.x, p.y)
}

/// One description line for an agent, newline terminated.
#[must_use]
pub fn describe_agent(agent: &Agent, mode: DescriptionMode) -> String {
    let future = agent.future_positions();
    match mode {
        DescriptionMode::Compact => {
            let destination = match (future.last(), agent.future_valid.last()) {
                (Some(end), Some(&true)) => fmt_point(end),
                _ => "unknown location".to_string(),
            };
            format!(
                " - {} at {}, moving to {}.\n",
                agent.short_name(),
                fmt_point(&agent.position()),
                destination
            )
        }
        DescriptionMode::Verbose => {
            let steps: Vec<String> = future
                .iter()
                .zip(agent.future_valid)
                .map(|(p, valid)| {
                    if valid {
                        fmt_point(p)
                    } else {
                        UNKNOWN_STEP.to_string()
                    }
                })
                .collect();
            format!(
                " - {} at {}. Future trajectory: [{}]\n",
                agent.name,
                fmt_point(&agent.position()),
                steps.join(", ")
            )
        }
    }
}

/// Description lines for every relevant agent, in input order.
#[must_use]
pub fn describe_scene(objects: &[Agent], config: &ReasoningConfig) -> String {
    let mut out = String::new();
    for (_, agent) in relevant_agents(objects, config.perception_range) {
        out.push_str(&describe_agent(agent, config.description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FUTURE_STEPS;

    fn agent(name: &str, x: f64, y: f64, step: Point2) -> Agent {
        Agent {
            name: name.to_string(),
            bbox: [x, y, 0.0, 2.0, 4.5, 1.6, 0.0],
            rel_future_offsets: [step; FUTURE_STEPS],
            future_valid: [true; FUTURE_STEPS],
        }
    }

    #[test]
    fn test_behind_agent_excluded() {
        let a = agent("vehicle.car", 1.0, -3.0, Point2::new(0.0, -0.5));
        assert_eq!(exclusion(&a, 20.0), Some(Exclusion::AlwaysBehind));
    }

    #[test]
    fn test_agent_moving_ahead_kept() {
        // starts behind, ends ahead
        let a = agent("vehicle.car", 1.0, -3.0, Point2::new(0.0, 1.0));
        assert!(is_relevant(&a, 20.0));
    }

    #[test]
    fn test_out_of_range_excluded() {
        let far = agent("vehicle.car", 25.0, 5.0, Point2::zeros());
        assert_eq!(exclusion(&far, 20.0), Some(Exclusion::OutOfRange));

        // current position in range, future leaves it
        let leaving = agent("vehicle.car", 0.0, 15.0, Point2::new(0.0, 1.0));
        assert_eq!(exclusion(&leaving, 20.0), Some(Exclusion::OutOfRange));
        assert!(is_relevant(&leaving, 25.0));
    }

    #[test]
    fn test_compact_line() {
        let a = agent("vehicle.car", 1.0, 5.0, Point2::new(0.0, 0.5));
        assert_eq!(
            describe_agent(&a, DescriptionMode::Compact),
            " - car at (1.00,5.00), moving to (1.00,8.00).\n"
        );
    }

    #[test]
    fn test_compact_line_unknown_end() {
        let mut a = agent("human.pedestrian.adult", -2.5, 3.25, Point2::zeros());
        a.future_valid[FUTURE_STEPS - 1] = false;
        assert_eq!(
            describe_agent(&a, DescriptionMode::Compact),
            " - adult at (-2.50,3.25), moving to unknown location.\n"
        );
    }

    #[test]
    fn test_verbose_line() {
        let mut a = agent("vehicle.car", 0.0, 2.0, Point2::new(0.0, 1.0));
        a.future_valid[1] = false;
        assert_eq!(
            describe_agent(&a, DescriptionMode::Verbose),
            " - vehicle.car at (0.00,2.00). Future trajectory: [(0.00,3.00), (UN,UN), \
             (0.00,5.00), (0.00,6.00), (0.00,7.00), (0.00,8.00)]\n"
        );
    }

    #[test]
    fn test_scene_preserves_order_and_filters() {
        let objects = vec![
            agent("vehicle.truck", 3.0, 10.0, Point2::zeros()),
            agent("vehicle.car", 0.0, -10.0, Point2::zeros()),
            agent("movable_object.barrier", -4.0, 6.0, Point2::zeros()),
        ];
        let text = describe_scene(&objects, &ReasoningConfig::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" - truck"));
        assert!(lines[1].starts_with(" - barrier"));
    }
}
