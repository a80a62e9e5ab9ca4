//! # Camera Projection
//!
//! Maps world-space points to normalized image coordinates: `x, y ∈ [0, 1]`
//! inside the frame, origin at the bottom-left corner, Y up.
//!
//! ## Coordinate System
//! View space is right-handed and Y-up with the camera looking down -Z, as
//! produced by [`Mat4Ext::look_at`].

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Mat4Ext, Point2, Point3, Vec3};

/// Anything that can place a world-space point on the image plane
///
/// Renderers with their own camera model implement this directly.
pub trait CameraProjection {
    /// Normalized image coordinate of `point` (origin bottom-left)
    ///
    /// Points on or behind the camera plane yield non-finite coordinates.
    fn world_to_camera(&self, point: &Point3) -> Point2;
}

impl<C: CameraProjection + ?Sized> CameraProjection for &C {
    fn world_to_camera(&self, point: &Point3) -> Point2 {
        (**self).world_to_camera(point)
    }
}

impl<C: CameraProjection + ?Sized> CameraProjection for Box<C> {
    fn world_to_camera(&self, point: &Point3) -> Point2 {
        (**self).world_to_camera(point)
    }
}

/// Projection model of a [`Camera`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Pinhole projection
    Perspective {
        /// Vertical field of view in radians
        fov_y: f64,
    },
    /// Parallel projection
    Orthographic {
        /// World-space height of the visible frame
        height: f64,
    },
}

/// Look-at camera with a perspective or orthographic lens
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera looks at in world space
    pub target: Vec3,
    /// Up vector (need not be orthogonal to the view direction)
    pub up: Vec3,
    /// Lens model
    pub projection: Projection,
    /// Image width divided by height
    pub aspect: f64,
}

impl Camera {
    /// Perspective camera looking at the origin, +Y up
    pub fn perspective(position: Vec3, fov_y: f64, aspect: f64) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Perspective { fov_y },
            aspect,
        }
    }

    /// Orthographic camera looking at the origin, +Y up
    pub fn orthographic(position: Vec3, height: f64, aspect: f64) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Orthographic { height },
            aspect,
        }
    }

    /// Aim the camera at `target` with the given up vector
    pub fn look_at(mut self, target: Vec3, up: Vec3) -> Self {
        self.target = target;
        self.up = up;
        self
    }

    /// World-to-view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }
}

impl CameraProjection for Camera {
    fn world_to_camera(&self, point: &Point3) -> Point2 {
        let view = self.view_matrix().transform_point(point);
        let depth = -view.z;

        let (x_ndc, y_ndc) = match self.projection {
            Projection::Perspective { fov_y } => {
                if depth <= 0.0 {
                    return Point2::new(f64::NAN, f64::NAN);
                }
                let half_height = depth * (fov_y * 0.5).tan();
                (view.x / (half_height * self.aspect), view.y / half_height)
            }
            Projection::Orthographic { height } => {
                let half_height = height * 0.5;
                (view.x / (half_height * self.aspect), view.y / half_height)
            }
        };

        Point2::new((x_ndc + 1.0) * 0.5, (y_ndc + 1.0) * 0.5)
    }
}
