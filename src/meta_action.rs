//! Rule-based meta-action classification.
//!
//! Two stages. The speed class compares the current speed (last history
//! step) with the end speed (last future step). Unless the ego stops, the
//! lateral class then looks at the lateral (X) offsets of the future path.
//! The result reads like `MOVE FORWARD WITH A CONSTANT SPEED`.
//!
//! # Compatibility
//!
//! The left lane change is written `CHANGE LANE TO LEFT`. Earlier planner
//! fine-tuning data spells it `CHANE LANE TO LEFT`; targets generated here
//! will not match that text byte for byte, so do not mix the two when
//! comparing or deduplicating supervision data.

use std::fmt;

use crate::config::{ReasoningConfig, ZeroLateralPolicy};
use crate::error::{ReasoningError, Result};
use crate::math::Point2;
use crate::record::EgoState;

/// Speed behavior over the future window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedClass {
    Stop,
    DecelToZero,
    Constant,
    Decel,
    QuickDecel,
    Accel,
    QuickAccel,
}

impl SpeedClass {
    /// Classify from current and end speed (m per 0.5 s).
    ///
    /// Thresholds are strict: a speed equal to `eps` is not stopped.
    #[must_use]
    pub fn classify(current: f64, end: f64, eps: f64) -> Self {
        if current < eps && end < eps {
            Self::Stop
        } else if end < eps {
            Self::DecelToZero
        } else if (end - current).abs() < eps {
            Self::Constant
        } else if current > end {
            if current > 2.0 * end {
                Self::QuickDecel
            } else {
                Self::Decel
            }
        } else if end > 2.0 * current {
            Self::QuickAccel
        } else {
            Self::Accel
        }
    }

    /// Text as it appears after `WITH`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::DecelToZero => "A DECELERATION TO ZERO",
            Self::Constant => "A CONSTANT SPEED",
            Self::Decel => "A DECELERATION",
            Self::QuickDecel => "A QUICK DECELERATION",
            Self::Accel => "AN ACCELERATION",
            Self::QuickAccel => "A QUICK ACCELERATION",
        }
    }
}

/// Lateral behavior over the future window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LateralClass {
    Forward,
    TurnLeft,
    LaneChangeLeft,
    TurnRight,
    LaneChangeRight,
}

impl LateralClass {
    /// Classify from future lateral offsets (X of each future position).
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningError::InvalidState`] when some offset leaves the
    /// forward band but the final offset is exactly zero, under
    /// [`ZeroLateralPolicy::Fail`].
    pub fn classify(future: &[Point2], config: &ReasoningConfig) -> Result<Self> {
        if future.iter().all(|p| p.x.abs() < config.forward_threshold) {
            return Ok(Self::Forward);
        }
        let last = future.last().map_or(0.0, |p| p.x);
        let turn = last.abs() > config.turn_threshold;
        if last < 0.0 {
            Ok(if turn {
                Self::TurnLeft
            } else {
                Self::LaneChangeLeft
            })
        } else if last > 0.0 {
            Ok(if turn {
                Self::TurnRight
            } else {
                Self::LaneChangeRight
            })
        } else {
            match config.zero_lateral {
                ZeroLateralPolicy::Forward => Ok(Self::Forward),
                ZeroLateralPolicy::Fail => Err(ReasoningError::invalid_state(format!(
                    "undefined lateral behavior: final lateral offset is {last} \
                     after leaving the forward band"
                ))),
            }
        }
    }

    /// Text as it appears before `WITH`.
    ///
    /// See the module docs for the left lane change spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "MOVE FORWARD",
            Self::TurnLeft => "TURN LEFT",
            Self::LaneChangeLeft => "CHANGE LANE TO LEFT",
            Self::TurnRight => "TURN RIGHT",
            Self::LaneChangeRight => "CHANGE LANE TO RIGHT",
        }
    }
}

/// Combined meta action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaAction {
    /// The ego is and stays stopped; no lateral class applies.
    Stop,
    /// Moving with a lateral and speed behavior.
    Move {
        lateral: LateralClass,
        speed: SpeedClass,
    },
}

impl fmt::Display for MetaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str(SpeedClass::Stop.as_str()),
            Self::Move { lateral, speed } => {
                write!(f, "{} WITH {}", lateral.as_str(), speed.as_str())
            }
        }
    }
}

/// Classify the ego's meta action from history and ground-truth future.
///
/// # Errors
///
/// Returns [`ReasoningError::MissingGroundTruth`] for records without a
/// future, and [`ReasoningError::InvalidState`] from the lateral stage.
pub fn classify(ego: &EgoState, config: &ReasoningConfig) -> Result<MetaAction> {
    let future = ego.require_future_trajectory()?;
    let future_diff = ego.require_future_diff()?;

    let current = ego.history_diff().last().map_or(0.0, |v| v.norm());
    let end = future_diff.last().map_or(0.0, |v| v.norm());
    let speed = SpeedClass::classify(current, end, config.speed_eps);
    if speed == SpeedClass::Stop {
        return Ok(MetaAction::Stop);
    }

    let lateral = LateralClass::classify(future, config)?;
    Ok(MetaAction::Move { lateral, speed })
}
