//! # UV to Image Projection
//!
//! Maps a texture-space point onto the deformed surface and through the
//! camera:
//!
//! 1. Ask the [`FaceLocator`] for the faces around the nearest UV vertex
//! 2. Keep the first face whose UV triangle contains the point
//! 3. Blend that face's 3-D corners with the point's barycentric weights
//! 4. Move the result to world space and project it with the camera
//!
//! Normalized image space has its origin at the bottom-left, Y up.

use thiserror::Error;

use crate::core::config::ProjectionConfig;
use crate::foundation::math::Point2;
use crate::geometry::barycentric;
use crate::geometry::{CameraProjection, UvMesh};
use crate::spatial::FaceLocator;
use crate::text::TextureBox;

/// Per-point projection failures
///
/// All of these drop one glyph, never the frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// None of the candidate faces contains the point
    #[error("No face contains UV point ({u:.6}, {v:.6})")]
    FaceNotFound {
        /// U coordinate of the query
        u: f64,
        /// V coordinate of the query
        v: f64,
    },

    /// The face has zero area in UV space
    #[error("Face {face} has a degenerate UV triangle")]
    DegenerateFace {
        /// Offending face id
        face: usize,
    },

    /// The camera returned NaN or infinity (point on or behind the camera)
    #[error("Projection of UV point ({u:.6}, {v:.6}) is not finite")]
    NonFiniteProjection {
        /// U coordinate of the query
        u: f64,
        /// V coordinate of the query
        v: f64,
    },

    /// The projected quad's edges cancel out; no baseline direction exists
    #[error("Glyph quad has no defined orientation")]
    DegenerateOrientation,
}

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// First face among `candidates` whose UV triangle contains `uv`
///
/// Weights may stray outside `[0, 1]` by at most `epsilon`. Unknown face ids
/// and degenerate faces are skipped.
pub fn locate_face(
    candidates: &[usize],
    uv: &Point2,
    mesh: &UvMesh,
    epsilon: f64,
) -> ProjectionResult<usize> {
    candidates
        .iter()
        .copied()
        .find(|&id| {
            mesh.face(id)
                .and_then(|face| barycentric::barycentric(uv, &face.uvs))
                .is_some_and(|weights| barycentric::contains(&weights, epsilon))
        })
        .ok_or(ProjectionError::FaceNotFound { u: uv.x, v: uv.y })
}

/// Normalized image point of `uv`, which must lie on face `face_id`
pub fn project(
    face_id: usize,
    uv: &Point2,
    mesh: &UvMesh,
    camera: &dyn CameraProjection,
) -> ProjectionResult<Point2> {
    let face = mesh
        .face(face_id)
        .ok_or(ProjectionError::FaceNotFound { u: uv.x, v: uv.y })?;
    let weights = barycentric::barycentric(uv, &face.uvs)
        .ok_or(ProjectionError::DegenerateFace { face: face_id })?;

    let local = barycentric::interpolate(&weights, &mesh.face_positions(face));
    let image = camera.world_to_camera(&mesh.to_world(&local));

    if image.x.is_finite() && image.y.is_finite() {
        Ok(image)
    } else {
        Err(ProjectionError::NonFiniteProjection { u: uv.x, v: uv.y })
    }
}

/// Four projected corners of a glyph box, in order TL, TR, BR, BL
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedQuad {
    /// Corners in normalized image space
    pub corners: [Point2; 4],
}

impl ProjectedQuad {
    /// Top-left corner
    pub fn top_left(&self) -> Point2 {
        self.corners[0]
    }

    /// Top-right corner
    pub fn top_right(&self) -> Point2 {
        self.corners[1]
    }

    /// Bottom-right corner
    pub fn bottom_right(&self) -> Point2 {
        self.corners[2]
    }

    /// Bottom-left corner
    pub fn bottom_left(&self) -> Point2 {
        self.corners[3]
    }
}

/// Projector bound to one frame's mesh and camera
pub struct UvProjector<'a> {
    mesh: &'a UvMesh,
    camera: &'a dyn CameraProjection,
    locator: FaceLocator,
    containment_epsilon: f64,
    fallback_scan: bool,
}

impl<'a> UvProjector<'a> {
    /// Index `mesh` and bind it to `camera`
    pub fn new(mesh: &'a UvMesh, camera: &'a dyn CameraProjection, config: &ProjectionConfig) -> Self {
        Self {
            mesh,
            camera,
            locator: FaceLocator::build(mesh, &config.quadtree),
            containment_epsilon: config.containment_epsilon,
            fallback_scan: config.fallback_scan,
        }
    }

    /// Face containing `uv`, trying every face when the candidates miss and the scan is enabled
    pub fn locate(&self, uv: &Point2) -> ProjectionResult<usize> {
        let candidates = self.locator.nearest_face_candidates(uv);
        match locate_face(candidates, uv, self.mesh, self.containment_epsilon) {
            Err(ProjectionError::FaceNotFound { .. }) if self.fallback_scan => {
                log::trace!("Candidates miss ({:.6}, {:.6}); scanning all faces", uv.x, uv.y);
                let all: Vec<usize> = (0..self.mesh.face_count()).collect();
                locate_face(&all, uv, self.mesh, self.containment_epsilon)
            }
            result => result,
        }
    }

    /// Normalized image point of a texture-space point
    pub fn map_coord(&self, uv: &Point2) -> ProjectionResult<Point2> {
        let face = self.locate(uv)?;
        project(face, uv, self.mesh, self.camera)
    }

    /// Project the four corners of a glyph box
    pub fn project_quad(&self, texture_box: &TextureBox) -> ProjectionResult<ProjectedQuad> {
        let [tl, tr, br, bl] = texture_box.corners();
        Ok(ProjectedQuad {
            corners: [
                self.map_coord(&tl)?,
                self.map_coord(&tr)?,
                self.map_coord(&br)?,
                self.map_coord(&bl)?,
            ],
        })
    }

    /// The face locator built for this mesh
    pub fn locator(&self) -> &FaceLocator {
        &self.locator
    }
}
