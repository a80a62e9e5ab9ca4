//! # Per-Frame Annotation
//!
//! Turns one frame's texture layout plus the renderer's deformed mesh and
//! camera into pixel-space glyph annotations.
//!
//! ## Drop Policy
//! A glyph that cannot be projected, whose box has an extreme aspect ratio,
//! or whose quad has no orientation is dropped and counted in the
//! [`FrameReport`]. None of these fail the frame.

use std::ops::AddAssign;

use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;

use crate::annotate::{
    orientation, rectify, to_pixel_space, AnnotatedBoundingBox, AnnotationSet, AspectFilter,
    ProjectionError, UvProjector,
};
use crate::core::config::{FilterConfig, ProjectionConfig};
use crate::foundation::math::ImageSize;
use crate::geometry::{CameraProjection, MeshError, UvMesh};
use crate::text::{FontDescriptor, FontError, LayoutError, TextureLayout};

/// Frame-fatal errors
#[derive(Error, Debug)]
pub enum FrameError {
    /// The renderer could not produce the frame
    #[error("Render failed: {0}")]
    Render(String),

    /// Glyph metrics were unavailable
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// The renderer handed over an invalid mesh
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// The page could not be laid out
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// What an external renderer hands back after deforming and rendering a receipt
pub struct RenderedFrame {
    /// Deformed mesh with its local-to-world transform
    pub mesh: UvMesh,
    /// Camera the image was rendered with
    pub camera: Box<dyn CameraProjection>,
    /// Rendered image size in pixels
    pub render_size: ImageSize,
}

impl std::fmt::Debug for RenderedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedFrame")
            .field("vertices", &self.mesh.vertex_count())
            .field("faces", &self.mesh.face_count())
            .field("render_size", &self.render_size)
            .finish_non_exhaustive()
    }
}

/// Renderer seam: paints the layout onto a surface, deforms and renders it
pub trait FrameRenderer {
    /// Undeformed surface `(width, height)` in world units; sets the texture aspect
    fn surface_size(&self) -> (f64, f64);

    /// Render one frame
    ///
    /// `rng` is the frame's random source; drawing scene randomness from it
    /// keeps the frame reproducible from its seed.
    fn render(
        &mut self,
        layout: &TextureLayout,
        font: &FontDescriptor,
        rng: &mut StdRng,
    ) -> Result<RenderedFrame, FrameError>;
}

/// Counters for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Glyph boxes produced by the layout
    pub glyphs_placed: usize,
    /// Annotations emitted
    pub annotations: usize,
    /// Dropped: no face contained a corner
    pub face_not_found: usize,
    /// Dropped: a corner hit a degenerate face or projected to infinity
    pub degenerate_projection: usize,
    /// Dropped: width/height outside the accepted band
    pub extreme_aspect: usize,
    /// Dropped: quad had no baseline direction
    pub degenerate_orientation: usize,
}

impl FrameReport {
    /// Total glyphs dropped for any reason
    pub fn dropped(&self) -> usize {
        self.face_not_found
            + self.degenerate_projection
            + self.extreme_aspect
            + self.degenerate_orientation
    }

    fn record_error(&mut self, error: &ProjectionError) {
        match error {
            ProjectionError::FaceNotFound { .. } => self.face_not_found += 1,
            ProjectionError::DegenerateFace { .. } | ProjectionError::NonFiniteProjection { .. } => {
                self.degenerate_projection += 1;
            }
            ProjectionError::DegenerateOrientation => self.degenerate_orientation += 1,
        }
    }
}

impl AddAssign for FrameReport {
    fn add_assign(&mut self, other: Self) {
        self.glyphs_placed += other.glyphs_placed;
        self.annotations += other.annotations;
        self.face_not_found += other.face_not_found;
        self.degenerate_projection += other.degenerate_projection;
        self.extreme_aspect += other.extreme_aspect;
        self.degenerate_orientation += other.degenerate_orientation;
    }
}

/// Everything one frame produced
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Frame number within the batch
    pub index: u64,
    /// Seed the frame was generated from
    pub seed: u64,
    /// Texture layout, including the text lines for painting
    pub layout: TextureLayout,
    /// Recovered glyph annotations
    pub annotations: AnnotationSet,
    /// Drop counters
    pub report: FrameReport,
}

/// Projects a layout's glyph boxes into a rendered frame
#[derive(Debug, Clone)]
pub struct FrameAnnotator {
    projection: ProjectionConfig,
    filter: AspectFilter,
}

impl FrameAnnotator {
    /// Create an annotator
    pub fn new(projection: &ProjectionConfig, filter: &FilterConfig) -> Self {
        Self {
            projection: projection.clone(),
            filter: AspectFilter::from(filter),
        }
    }

    /// Annotate every glyph box of `layout` in `frame`
    pub fn annotate(&self, layout: &TextureLayout, frame: &RenderedFrame) -> (AnnotationSet, FrameReport) {
        let projector = UvProjector::new(&frame.mesh, frame.camera.as_ref(), &self.projection);
        let size = frame.render_size;
        let mut annotations = AnnotationSet::new();
        let mut report = FrameReport::default();

        for (glyph, texture_box) in layout.iter_boxes() {
            report.glyphs_placed += 1;

            let quad = match projector.project_quad(texture_box) {
                Ok(quad) => quad,
                Err(e) => {
                    log::trace!("Dropping '{glyph}': {e}");
                    report.record_error(&e);
                    continue;
                }
            };

            let (upper_left, lower_right) = rectify(&quad.corners);
            let upper_left = to_pixel_space(size, &upper_left);
            let lower_right = to_pixel_space(size, &lower_right);
            let width = (lower_right.x - upper_left.x).abs();
            let height = (lower_right.y - upper_left.y).abs();

            if !self.filter.keep(width, height) {
                log::trace!("Dropping '{glyph}': aspect {width:.1}x{height:.1}");
                report.extreme_aspect += 1;
                continue;
            }

            let corners = quad.corners.map(|c| to_pixel_space(size, &c));
            let orientation = match orientation(&corners) {
                Ok(direction) => direction,
                Err(e) => {
                    log::trace!("Dropping '{glyph}': {e}");
                    report.record_error(&e);
                    continue;
                }
            };

            annotations.push(AnnotatedBoundingBox {
                glyph,
                upper_left,
                lower_right,
                width,
                height,
                corners,
                orientation,
            });
        }

        report.annotations = annotations.len();
        if report.face_not_found > 0 {
            log::debug!(
                "{} of {} glyphs had a corner outside every candidate face",
                report.face_not_found,
                report.glyphs_placed
            );
        }

        (annotations, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates() {
        let mut total = FrameReport::default();
        let frame = FrameReport {
            glyphs_placed: 10,
            annotations: 6,
            face_not_found: 1,
            degenerate_projection: 1,
            extreme_aspect: 1,
            degenerate_orientation: 1,
        };
        total += frame;
        total += frame;

        assert_eq!(total.glyphs_placed, 20);
        assert_eq!(total.dropped(), 8);
        assert_eq!(total.annotations + total.dropped(), total.glyphs_placed);
    }

    #[test]
    fn test_errors_land_in_matching_counter() {
        let mut report = FrameReport::default();
        report.record_error(&ProjectionError::FaceNotFound { u: 0.0, v: 0.0 });
        report.record_error(&ProjectionError::NonFiniteProjection { u: 0.0, v: 0.0 });
        report.record_error(&ProjectionError::DegenerateFace { face: 3 });
        report.record_error(&ProjectionError::DegenerateOrientation);

        assert_eq!(report.face_not_found, 1);
        assert_eq!(report.degenerate_projection, 2);
        assert_eq!(report.degenerate_orientation, 1);
        assert_eq!(report.dropped(), 4);
    }
}
