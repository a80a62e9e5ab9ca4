//! Per-frame pipeline and batch driver
//!
//! Wires text layout, the external renderer and glyph box recovery into
//! reproducible frames.

pub mod batch;
pub mod frame;

pub use batch::{annotation_path, frame_seed, BatchError, BatchRunner, BatchSummary};
pub use frame::{
    FrameAnnotator, FrameError, FrameOutput, FrameRenderer, FrameReport, RenderedFrame,
};
