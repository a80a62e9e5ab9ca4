//! # Receipt Synth
//!
//! Synthetic training data for printed receipt text. Glyphs are laid out in a
//! flat texture, the texture is wrapped onto a deformed mesh by an external
//! renderer, and every glyph's box is recovered in the rendered image.
//!
//! ## Features
//!
//! - **Text Layout**: Random word streams packed into width-bounded lines with
//!   tight per-glyph boxes in texture space
//! - **UV Projection**: Nearest-vertex face location and barycentric mapping
//!   from texture space through the deformed mesh into the camera image
//! - **Rectification**: Axis-aligned image boxes, aspect filtering and text
//!   orientation per glyph
//! - **Batch Driver**: Reproducible, seeded frames with per-frame diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receipt_synth::prelude::*;
//!
//! fn annotate(layout: &TextureLayout, frame: &RenderedFrame) {
//!     let config = SynthConfig::default();
//!     let annotator = FrameAnnotator::new(&config.projection, &config.filter);
//!     let (annotations, report) = annotator.annotate(layout, frame);
//!     log::info!("{} boxes, {} dropped", annotations.len(), report.dropped());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration
pub mod core;
pub mod config;

pub mod foundation;
pub mod text;
pub mod geometry;
pub mod spatial;
pub mod annotate;
pub mod pipeline;

#[cfg(test)]
mod tests;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        annotate::{
            AnnotatedBoundingBox, AnnotationSet, ProjectedQuad, ProjectionError, UvProjector,
        },
        config::{Config, ConfigError},
        core::config::{BatchConfig, FilterConfig, LayoutConfig, ProjectionConfig, SynthConfig},
        foundation::math::{ImageSize, Point2, Point3, Vec2, Vec3},
        geometry::{Camera, CameraProjection, Face, Projection, UvMesh},
        pipeline::{
            BatchRunner, BatchSummary, FrameAnnotator, FrameError, FrameOutput, FrameRenderer,
            FrameReport, RenderedFrame,
        },
        spatial::FaceLocator,
        text::{
            FixedMetrics, FontDescriptor, FontdueMetrics, GlyphMetrics, GlyphMetricsProvider,
            GlyphStream, LayoutParams, PageGeometry, TextLayout, TextureBox, TextureLayout,
        },
    };
}
