//! 2D vector helpers for ego-frame waypoints.
//!
//! All positions live in a single ego-centered frame: X is lateral
//! (positive to the right), Y is along the ego heading.

use nalgebra::Vector2;

/// A 2D position or displacement in meters, ego frame.
pub type Point2 = Vector2<f64>;

/// Running sum of a sequence of displacements.
///
/// The i-th output is the sum of the first `i + 1` inputs, so the result
/// has the same length as the input.
#[must_use]
pub fn cumulative_sum(steps: &[Point2]) -> Vec<Point2> {
    steps
        .iter()
        .scan(Point2::zeros(), |acc, step| {
            *acc += step;
            Some(*acc)
        })
        .collect()
}

/// Shift every point by `offset`.
#[must_use]
pub fn translate(points: &[Point2], offset: Point2) -> Vec<Point2> {
    points.iter().map(|p| p + offset).collect()
}

/// Point from a raw `[x, y]` pair.
#[inline]
#[must_use]
pub fn point(xy: [f64; 2]) -> Point2 {
    Point2::new(xy[0], xy[1])
}
