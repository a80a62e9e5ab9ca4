//! Barycentric coordinates from signed sub-triangle areas
//!
//! Areas keep their sign. A clockwise triangle has a negative area and so do
//! its sub-triangles for interior points, which keeps the ratios correct for
//! either winding.

use crate::foundation::math::{Point2, Point3};

/// Signed area of triangle `abc`; positive when counter-clockwise
pub fn signed_area(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) * 0.5
}

/// Weights of `p` with respect to `triangle`, or `None` for a degenerate triangle
///
/// Weight `i` is the area of the sub-triangle opposite corner `i` divided by
/// the full area, so the weights sum to one and equal exactly `1` at corner `i`.
pub fn barycentric(p: &Point2, triangle: &[Point2; 3]) -> Option<[f64; 3]> {
    let [v0, v1, v2] = triangle;
    let area = signed_area(v0, v1, v2);
    if area == 0.0 || !area.is_finite() {
        return None;
    }

    Some([
        signed_area(p, v1, v2) / area,
        signed_area(v0, p, v2) / area,
        signed_area(v0, v1, p) / area,
    ])
}

/// Whether every weight lies in `[-epsilon, 1 + epsilon]`
pub fn contains(weights: &[f64; 3], epsilon: f64) -> bool {
    weights
        .iter()
        .all(|&w| w >= -epsilon && w <= 1.0 + epsilon)
}

/// Blend three points with barycentric weights; weight `i` scales point `i`
pub fn interpolate(weights: &[f64; 3], points: &[Point3; 3]) -> Point3 {
    Point3::from(
        points[0].coords * weights[0] + points[1].coords * weights[1] + points[2].coords * weights[2],
    )
}
