//! Collision geometry for the road
//!
//! Everything on the road is an axis-aligned box. Vehicles only ever move
//! along x (plus the y interpolation of a lane change), so closing distances
//! and time-to-collision are one-dimensional.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Strict overlap (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Euclidean distance from `point` to the nearest point of the box
    /// (zero when inside)
    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        let closest = point.clamp(self.min, self.max);
        (point - closest).length()
    }
}

/// Free space between two boxes along x, given centers and widths
/// (negative when they overlap)
#[inline]
pub fn edge_gap(x_a: f32, width_a: f32, x_b: f32, width_b: f32) -> f32 {
    (x_b - x_a).abs() - (width_a + width_b) * 0.5
}

/// Time until two vehicles travelling toward each other meet
///
/// `a` moves with signed velocity `vel_a`, `b` with `vel_b`. Returns `None`
/// when they are not on a collision course (moving apart, parallel, or not
/// closing). Overlapping vehicles on a closing course return `Some(0.0)`.
pub fn time_to_collision(x_a: f32, width_a: f32, vel_a: f32, x_b: f32, width_b: f32, vel_b: f32) -> Option<f32> {
    let dx = x_b - x_a;
    // Closing rate along the line from a to b
    let closing = (vel_a - vel_b) * dx.signum();
    if closing <= f32::EPSILON || dx == 0.0 {
        return None;
    }
    let gap = edge_gap(x_a, width_a, x_b, width_b).max(0.0);
    Some(gap / closing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::from_center(Vec2::new(8.0, 0.0), Vec2::new(10.0, 10.0));
        let c = Aabb::from_center(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&b));
        // Touching edges only
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_distance_to_point() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert_eq!(a.distance_to_point(Vec2::new(1.0, 1.0)), 0.0);
        assert!((a.distance_to_point(Vec2::new(8.0, 0.0)) - 3.0).abs() < 1e-5);
        assert!((a.distance_to_point(Vec2::new(8.0, 9.0)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_ttc_head_on() {
        // 100px apart center-to-center, widths 20 => 80px gap, closing 40px/s
        let ttc = time_to_collision(0.0, 20.0, 20.0, 100.0, 20.0, -20.0).unwrap();
        assert!((ttc - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_ttc_moving_apart_is_none() {
        assert!(time_to_collision(0.0, 20.0, -20.0, 100.0, 20.0, 20.0).is_none());
    }

    #[test]
    fn test_ttc_against_stationary() {
        let ttc = time_to_collision(100.0, 20.0, -10.0, 0.0, 20.0, 0.0).unwrap();
        assert!((ttc - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_ttc_overlapping_is_zero() {
        let ttc = time_to_collision(0.0, 20.0, 10.0, 5.0, 20.0, -10.0).unwrap();
        assert_eq!(ttc, 0.0);
    }
}
