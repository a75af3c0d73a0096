//! Mathematical utilities for scene reasoning.
//!
//! This module provides:
//! - [`vec2`]: 2D waypoint helpers on top of `nalgebra::Vector2`

pub mod vec2;

pub use vec2::{cumulative_sum, point, translate, Point2};
