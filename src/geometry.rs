//! Shared geometry primitives: line distance, box orientation, median,
//! and greedy center-distance suppression.

use crate::types::{OrientedBox, Point};
use std::f64::consts::FRAC_PI_2;

/// Distance from `point` to the infinite line through `origin` along the
/// unit vector `direction`.
pub fn perpendicular_distance(origin: Point, direction: Point, point: Point) -> f64 {
    let v = point - origin;
    let along = v.dot(direction);
    (v - direction.scale(along)).norm()
}

/// Angle of the box's long axis. Boxes taller than wide are rotated by 90°.
pub fn principal_angle(b: &OrientedBox) -> f64 {
    if b.width >= b.height {
        b.angle
    } else {
        b.angle + FRAC_PI_2
    }
}

/// Unit vector along `angle`.
pub fn tangent(angle: f64) -> Point {
    Point::new(angle.cos(), angle.sin())
}

/// Unit vector perpendicular to `tangent(angle)`.
pub fn normal(angle: f64) -> Point {
    Point::new(-angle.sin(), angle.cos())
}

/// Median of the values; even-length input averages the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Greedy non-maximum suppression on center distance.
///
/// Candidates are visited by confidence, highest first; a box is kept only
/// if its center is at least `min_dist` from every box already kept.
/// Returned boxes are in visiting order.
pub fn suppress_duplicates(boxes: &[OrientedBox], min_dist: f64) -> Vec<OrientedBox> {
    let mut ranked = boxes.to_vec();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<OrientedBox> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        if kept
            .iter()
            .all(|k| k.center.distance(candidate.center) >= min_dist)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// Boxes whose confidence clears `threshold`.
pub fn confident(boxes: &[OrientedBox], threshold: f64) -> Vec<OrientedBox> {
    boxes
        .iter()
        .filter(|b| b.confidence >= threshold)
        .copied()
        .collect()
}
