//! Axis-aligned boxes, aspect filtering and text orientation
//!
//! A projected glyph quad is generally not a rectangle once the surface is
//! bent. Detectors want axis-aligned boxes, so the quad is replaced by its
//! bounding rectangle and the skew is kept separately as an orientation
//! vector.

use crate::core::config::FilterConfig;
use crate::foundation::math::{ImageSize, Point2, Vec2};

use super::projector::{ProjectionError, ProjectionResult};

/// Bounding rectangle of four points as `(upper_left, lower_right)`
///
/// In Y-up normalized space the upper-left corner has the largest Y.
pub fn rectify(points: &[Point2; 4]) -> (Point2, Point2) {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    (Point2::new(min_x, max_y), Point2::new(max_x, min_y))
}

/// Normalized image point (origin bottom-left) to pixels (origin top-left)
pub fn to_pixel_space(size: ImageSize, p: &Point2) -> Point2 {
    Point2::new(p.x * size.width_f(), (1.0 - p.y) * size.height_f())
}

/// Band of accepted width/height ratios
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectFilter {
    /// Narrowest accepted ratio
    pub min_ratio: f64,
    /// Widest accepted ratio
    pub max_ratio: f64,
}

impl AspectFilter {
    /// Create a filter over `[min_ratio, max_ratio]`
    pub const fn new(min_ratio: f64, max_ratio: f64) -> Self {
        Self { min_ratio, max_ratio }
    }

    /// Whether a `width` x `height` box is kept
    ///
    /// Zero height and non-finite ratios are rejected.
    pub fn keep(&self, width: f64, height: f64) -> bool {
        if height == 0.0 {
            return false;
        }
        let ratio = width / height;
        ratio.is_finite() && ratio >= self.min_ratio && ratio <= self.max_ratio
    }
}

impl Default for AspectFilter {
    fn default() -> Self {
        Self::from(&FilterConfig::default())
    }
}

impl From<&FilterConfig> for AspectFilter {
    fn from(config: &FilterConfig) -> Self {
        Self::new(config.min_aspect_ratio, config.max_aspect_ratio)
    }
}

/// [`AspectFilter::keep`] with the stock band `[1/15, 3]`
pub fn filter(width: f64, height: f64) -> bool {
    AspectFilter::default().keep(width, height)
}

/// Unit direction of a quad's baseline from its corners in TL, TR, BR, BL order
///
/// Averages the top and bottom edges.
pub fn orientation(corners: &[Point2; 4]) -> ProjectionResult<Vec2> {
    let [tl, tr, br, bl] = corners;
    let sum: Vec2 = (tr - tl) + (br - bl);
    let length = sum.norm();
    if length == 0.0 || !length.is_finite() {
        return Err(ProjectionError::DegenerateOrientation);
    }
    Ok(sum / length)
}
