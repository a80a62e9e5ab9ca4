//! Math utilities and types
//!
//! Double precision throughout: barycentric ratios of thin UV triangles and
//! the normalization round trip both lose too much in `f32`.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix4, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f64>;

/// 2D point type (UV space, normalized image space or pixels)
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// Size of an image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageSize {
    /// Create a new image size
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width as a float
    pub fn width_f(&self) -> f64 {
        f64::from(self.width)
    }

    /// Height as a float
    pub fn height_f(&self) -> f64 {
        f64::from(self.height)
    }

    /// Width divided by height
    pub fn aspect(&self) -> f64 {
        self.width_f() / self.height_f()
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f64 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * constants::DEG_TO_RAD
    }

    /// Uniform sample in `[range.0, range.1)`, or the lower bound for an empty range
    pub fn sample_range<R: rand::Rng + ?Sized>(rng: &mut R, range: (f64, f64)) -> f64 {
        if range.1 > range.0 {
            rng.gen_range(range.0..range.1)
        } else {
            range.0
        }
    }
}

/// Extension trait for Mat4 with view matrix construction
pub trait Mat4Ext {
    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        // Right-handed: the camera looks down its local -Z axis
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_look_at_maps_target_onto_negative_z() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));

        let target_in_view = view.transform_point(&Point3::origin());
        assert_relative_eq!(target_in_view, Point3::new(0.0, 0.0, -5.0), epsilon = 1e-12);

        let right_in_view = view.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(right_in_view.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_image_size_aspect() {
        let size = ImageSize::new(1440, 2560);
        assert_relative_eq!(size.aspect(), 0.5625);
    }
}
