//! Glyph box recovery in the rendered image
//!
//! Projects texture-space glyph boxes through the deformed mesh and camera,
//! rectifies the resulting quads and packages them as annotation records.

pub mod annotation;
pub mod projector;
pub mod rectify;

pub use annotation::{AnnotatedBoundingBox, AnnotationError, AnnotationSet};
pub use projector::{
    locate_face, project, ProjectedQuad, ProjectionError, ProjectionResult, UvProjector,
};
pub use rectify::{filter, orientation, rectify, to_pixel_space, AspectFilter};
