//! Receipt text generation
//!
//! Random glyph streams, per-font glyph metrics and the layout engine that
//! packs words into lines and records a tight texture-space box per glyph.

pub mod glyphs;
pub mod font;
pub mod layout;

pub use glyphs::GlyphStream;
pub use font::{
    FixedMetrics, FontDescriptor, FontError, FontResult, FontdueMetrics, GlyphMetrics,
    GlyphMetricsProvider, GlyphMetricsTable, MetricsCache,
};
pub use layout::{
    LayoutError, LayoutParams, LayoutResult, LineHeight, PageGeometry, TextLayout, TextSizer,
    TextureBox, TextureLayout,
};
