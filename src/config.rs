//! Configuration for scene reasoning.
//!
//! This module provides the [`ReasoningConfig`] struct which centralizes the
//! thresholds, margins and text policies used across the reasoning engine.
//!
//! # Example
//!
//! ```
//! use drive_reasoning::ReasoningConfig;
//!
//! // Use default configuration (compact scene lines)
//! let config = ReasoningConfig::default();
//!
//! // Full taxonomy names and per-step future paths
//! let verbose = ReasoningConfig::verbose().with_perception_range(30.0);
//! assert!(verbose.validate().is_ok());
//! ```

use crate::collision::{CollisionMargins, Footprint};
use crate::error::{ReasoningError, Result};

/// Configuration for scene reasoning.
///
/// Defaults reproduce the planner prompts the fine-tuning data was built
/// with; changing them changes the generated text.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningConfig {
    /// Maximum absolute coordinate (m) for an object to be described.
    pub perception_range: f64,

    /// Ego footprint used by the collision check.
    pub ego_footprint: Footprint,

    /// Safety margins added to the footprints.
    pub margins: CollisionMargins,

    /// Speed (m per 0.5 s) under which the ego counts as stopped, and the
    /// band within which current and end speed count as constant.
    pub speed_eps: f64,

    /// Lateral offset (m) every future waypoint must stay under to count as
    /// moving forward.
    pub forward_threshold: f64,

    /// Final lateral offset (m) above which a maneuver is a turn rather than
    /// a lane change.
    pub turn_threshold: f64,

    /// How objects are rendered into text.
    pub description: DescriptionMode,

    /// What to do when the final lateral offset is exactly zero.
    pub zero_lateral: ZeroLateralPolicy,

    /// Token ceiling for system + user prompt when worked examples are added.
    pub context_budget: usize,

    /// Number of worked examples prepended to the system prompt.
    pub in_context_examples: usize,
}

/// Object rendering mode for the scene describer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescriptionMode {
    /// Last taxonomy segment, current position and final future position.
    #[default]
    Compact,
    /// Full taxonomy name, current position and all six future steps.
    Verbose,
}

/// Handling of a zero final lateral offset in the lateral classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroLateralPolicy {
    /// Fail with [`ReasoningError::InvalidState`].
    #[default]
    Fail,
    /// Classify as moving forward.
    Forward,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            perception_range: 20.0,
            ego_footprint: Footprint::EGO,
            margins: CollisionMargins::default(),
            speed_eps: 0.5,
            forward_threshold: 2.0,
            turn_threshold: 4.0,
            description: DescriptionMode::Compact,
            zero_lateral: ZeroLateralPolicy::Fail,
            context_budget: 4096,
            in_context_examples: 5,
        }
    }
}

impl ReasoningConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.perception_range.is_nan() || self.perception_range <= 0.0 {
            return Err(ReasoningError::invalid_config(
                "perception_range must be positive",
            ));
        }
        if self.ego_footprint.half_width < 0.0 || self.ego_footprint.half_length < 0.0 {
            return Err(ReasoningError::invalid_config(
                "ego footprint extents must be non-negative",
            ));
        }
        if self.margins.lateral < 0.0 || self.margins.forward < 0.0 {
            return Err(ReasoningError::invalid_config(
                "collision margins must be non-negative",
            ));
        }
        if self.speed_eps.is_nan() || self.speed_eps <= 0.0 {
            return Err(ReasoningError::invalid_config("speed_eps must be positive"));
        }
        if self.forward_threshold < 0.0 {
            return Err(ReasoningError::invalid_config(
                "forward_threshold must be non-negative",
            ));
        }
        if self.turn_threshold < self.forward_threshold {
            return Err(ReasoningError::invalid_config(
                "turn_threshold must be >= forward_threshold",
            ));
        }
        if self.context_budget == 0 {
            return Err(ReasoningError::invalid_config(
                "context_budget must be at least 1",
            ));
        }
        Ok(())
    }

    /// Preset with short object names and final-position summaries.
    #[must_use]
    pub fn compact() -> Self {
        Self::default()
    }

    /// Preset with full object names and complete future paths.
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            description: DescriptionMode::Verbose,
            ..Self::default()
        }
    }

    /// Set the perception range.
    #[must_use]
    pub const fn with_perception_range(mut self, range: f64) -> Self {
        self.perception_range = range;
        self
    }

    /// Set the collision margins.
    #[must_use]
    pub const fn with_margins(mut self, margins: CollisionMargins) -> Self {
        self.margins = margins;
        self
    }

    /// Set the description mode.
    #[must_use]
    pub const fn with_description(mut self, mode: DescriptionMode) -> Self {
        self.description = mode;
        self
    }

    /// Set the zero lateral offset policy.
    #[must_use]
    pub const fn with_zero_lateral(mut self, policy: ZeroLateralPolicy) -> Self {
        self.zero_lateral = policy;
        self
    }

    /// Set the prompt token budget.
    #[must_use]
    pub const fn with_context_budget(mut self, budget: usize) -> Self {
        self.context_budget = budget;
        self
    }

    /// Set the number of worked examples.
    #[must_use]
    pub const fn with_in_context_examples(mut self, count: usize) -> Self {
        self.in_context_examples = count;
        self
    }
}
