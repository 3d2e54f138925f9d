//! Planar geometry shared by the path oracle, the gesture cutter and the
//! edge collision resolver.
//!
//! Intersection arithmetic runs in `f64` so that axis-aligned segments keep
//! their exact coordinates and the endpoint-inclusive containment tolerance
//! stays meaningful at arena scale.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance applied to determinants and to segment containment checks.
pub const EPSILON: f64 = 1e-6;

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and dimensions.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Horizontal coordinate of the upper-left corner.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate of the upper-left corner.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Horizontal extent of the rectangle.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent of the rectangle.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Computes the crossing point of segments `a1→a2` and `b1→b2`.
///
/// Parallel and degenerate pairs (determinant below [`EPSILON`]) never
/// intersect. The crossing point of the infinite lines must additionally lie
/// within both segments' bounding extents, endpoints included.
#[must_use]
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let (x1, y1, x2, y2) = (
        f64::from(a1.x),
        f64::from(a1.y),
        f64::from(a2.x),
        f64::from(a2.y),
    );
    let (x3, y3, x4, y4) = (
        f64::from(b1.x),
        f64::from(b1.y),
        f64::from(b2.x),
        f64::from(b2.y),
    );

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < EPSILON {
        return None;
    }

    let cross_a = x1 * y2 - y1 * x2;
    let cross_b = x3 * y4 - y3 * x4;
    let px = (cross_a * (x3 - x4) - (x1 - x2) * cross_b) / denom;
    let py = (cross_a * (y3 - y4) - (y1 - y2) * cross_b) / denom;

    if within_extent(px, py, (x1, y1, x2, y2)) && within_extent(px, py, (x3, y3, x4, y4)) {
        Some(Vec2::new(px as f32, py as f32))
    } else {
        None
    }
}

fn within_extent(px: f64, py: f64, (x1, y1, x2, y2): (f64, f64, f64, f64)) -> bool {
    px >= x1.min(x2) - EPSILON
        && px <= x1.max(x2) + EPSILON
        && py >= y1.min(y2) - EPSILON
        && py <= y1.max(y2) + EPSILON
}

/// Reports whether the segment `a→b` touches the rectangle.
///
/// Uses Liang-Barsky clipping, so a segment lying entirely inside the
/// rectangle counts as touching it.
#[must_use]
pub fn segment_intersects_rect(a: Vec2, b: Vec2, rect: &Rect) -> bool {
    let (ax, ay) = (f64::from(a.x), f64::from(a.y));
    let dx = f64::from(b.x) - ax;
    let dy = f64::from(b.y) - ay;
    let left = f64::from(rect.x);
    let top = f64::from(rect.y);
    let right = left + f64::from(rect.width);
    let bottom = top + f64::from(rect.height);

    let mut enter = 0.0_f64;
    let mut exit = 1.0_f64;
    let boundaries = [
        (-dx, ax - left),
        (dx, right - ax),
        (-dy, ay - top),
        (dy, bottom - ay),
    ];

    for (p, q) in boundaries {
        if p.abs() < EPSILON {
            if q < 0.0 {
                return false;
            }
            continue;
        }

        let ratio = q / p;
        if p < 0.0 {
            if ratio > exit {
                return false;
            }
            enter = enter.max(ratio);
        } else {
            if ratio < enter {
                return false;
            }
            exit = exit.min(ratio);
        }
    }

    enter <= exit
}

/// Normalised progress of `point` along `from→to`, clamped to `0.0..=1.0`.
///
/// A zero-length segment reports zero progress.
#[must_use]
pub fn progress_along(point: Vec2, from: Vec2, to: Vec2) -> f32 {
    let axis = to - from;
    let length_sq = axis.length_squared();
    if length_sq <= f32::EPSILON {
        return 0.0;
    }

    ((point - from).dot(axis) / length_sq).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_report_their_meeting_point() {
        let point = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
        )
        .expect("diagonals cross");

        assert!((point - Vec2::new(5.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn crossing_of_infinite_lines_outside_segments_is_rejected() {
        let point = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
        );

        assert!(point.is_none());
    }

    #[test]
    fn parallel_segments_never_intersect() {
        let point = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );

        assert!(point.is_none());
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        let point = segment_intersection(
            Vec2::new(0.0, 100.0),
            Vec2::new(300.0, 100.0),
            Vec2::new(150.0, 50.0),
            Vec2::new(150.0, 100.0),
        );

        assert_eq!(point, Some(Vec2::new(150.0, 100.0)));
    }

    #[test]
    fn segment_through_rectangle_is_obstructed() {
        let wall = Rect::new(240.0, 340.0, 340.0, 24.0);

        assert!(segment_intersects_rect(
            Vec2::new(450.0, 560.0),
            Vec2::new(320.0, 140.0),
            &wall
        ));
        assert!(!segment_intersects_rect(
            Vec2::new(160.0, 340.0),
            Vec2::new(320.0, 140.0),
            &wall
        ));
    }

    #[test]
    fn segment_inside_rectangle_is_obstructed() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);

        assert!(segment_intersects_rect(
            Vec2::new(10.0, 10.0),
            Vec2::new(20.0, 20.0),
            &rect
        ));
    }

    #[test]
    fn vertical_segment_beside_rectangle_is_clear() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);

        assert!(!segment_intersects_rect(
            Vec2::new(150.0, -50.0),
            Vec2::new(150.0, 150.0),
            &rect
        ));
    }

    #[test]
    fn progress_is_clamped_to_segment() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(100.0, 0.0);

        assert!((progress_along(Vec2::new(49.0, 3.0), from, to) - 0.49).abs() < 1e-6);
        assert_eq!(progress_along(Vec2::new(-20.0, 0.0), from, to), 0.0);
        assert_eq!(progress_along(Vec2::new(140.0, 0.0), from, to), 1.0);
        assert_eq!(progress_along(Vec2::new(5.0, 5.0), from, from), 0.0);
    }
}
