//! Text layout engine
//!
//! Fills the printable area of a receipt texture with random words and
//! records a tight box for every placed glyph. Boxes are collected in pixels
//! (origin top-left, Y down) and handed out in normalized texture space
//! (origin bottom-left, Y up), which is what the mesh UVs use.
//!
//! # Line Construction
//!
//! Words are appended to a line buffer until the measured width of the
//! buffer plus the next word reaches the maximum width. That word is dropped
//! and the line is committed without its trailing space. A word that alone is
//! wider than the page is still placed on its own line.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::font::{FontDescriptor, FontError, FontResult, GlyphMetricsTable};
use super::glyphs::GlyphStream;
use crate::foundation::math::{utils, ImageSize, Point2};

/// Errors that stop a layout
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Glyph metrics were unavailable
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// The surface the page is sized from has no usable aspect
    #[error("Surface {width}x{height} has no usable aspect ratio")]
    DegenerateSurface {
        /// Surface width
        width: f64,
        /// Surface height
        height: f64,
    },

    /// Line spacing and kerning must be positive and finite
    #[error("Invalid layout parameters: line spacing {line_spacing}, kerning {kerning}")]
    InvalidParams {
        /// Requested line spacing
        line_spacing: f64,
        /// Requested kerning
        kerning: f64,
    },

    /// Kerning must be positive and finite
    #[error("Invalid kerning {0}")]
    InvalidKerning(f64),

    /// The line width bound must be finite
    #[error("Invalid maximum line width {0}")]
    InvalidWidth(f64),
}

/// Result type for layout operations
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Which height sets the pitch between consecutive lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineHeight {
    /// Tallest glyph on the line being placed
    #[default]
    PerLine,
    /// Tallest glyph of the font's whole alphabet, for an even pitch
    FontMax,
}

/// Printable region of a receipt texture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Texture size in pixels
    pub image_size: ImageSize,
    /// Margin on every side, as a fraction of the texture width
    pub padding: f64,
}

impl PageGeometry {
    /// A page with no margin
    pub const fn new(image_size: ImageSize) -> Self {
        Self {
            image_size,
            padding: 0.0,
        }
    }

    /// A page `px_width` wide whose height keeps the undeformed surface's aspect
    ///
    /// Both surface sides must be positive and finite, and the resulting
    /// height must fit in a `u32`.
    pub fn from_aspect(px_width: u32, surface_width: f64, surface_height: f64) -> LayoutResult<Self> {
        let degenerate = LayoutError::DegenerateSurface {
            width: surface_width,
            height: surface_height,
        };
        let valid = |side: f64| side.is_finite() && side > 0.0;
        if !valid(surface_width) || !valid(surface_height) {
            return Err(degenerate);
        }

        let height = (f64::from(px_width) * (surface_height / surface_width)).round();
        if !height.is_finite() || height > f64::from(u32::MAX) {
            return Err(degenerate);
        }
        Ok(Self::new(ImageSize::new(px_width, height as u32)))
    }

    /// Set the margin fraction
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Margin in pixels
    pub fn padding_px(&self) -> f64 {
        self.padding * self.image_size.width_f()
    }

    /// Widest line allowed, in pixels
    pub fn max_width(&self) -> f64 {
        self.image_size.width_f() - 2.0 * self.padding_px()
    }

    /// Tallest text block allowed, in pixels
    pub fn max_height(&self) -> f64 {
        self.image_size.height_f() - 2.0 * self.padding_px()
    }
}

/// Per-frame typographic parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Multiplier on the line height between consecutive lines
    pub line_spacing: f64,
    /// Multiplier on each glyph's advance
    pub kerning: f64,
}

impl LayoutParams {
    /// Create layout parameters
    pub const fn new(line_spacing: f64, kerning: f64) -> Self {
        Self {
            line_spacing,
            kerning,
        }
    }

    /// Fails unless both multipliers are positive and finite
    pub fn validate(&self) -> LayoutResult<()> {
        let valid = |x: f64| x.is_finite() && x > 0.0;
        if valid(self.line_spacing) && valid(self.kerning) {
            Ok(())
        } else {
            Err(LayoutError::InvalidParams {
                line_spacing: self.line_spacing,
                kerning: self.kerning,
            })
        }
    }

    /// Draw parameters uniformly from the given ranges
    pub fn sample<R: Rng + ?Sized>(
        rng: &mut R,
        line_spacing_range: (f64, f64),
        kerning_range: (f64, f64),
    ) -> Self {
        Self {
            line_spacing: utils::sample_range(rng, line_spacing_range),
            kerning: utils::sample_range(rng, kerning_range),
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Axis-aligned glyph box in normalized texture space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureBox {
    /// Upper-left corner; has the larger V
    pub upper_left: Point2,
    /// Lower-right corner; has the smaller V
    pub lower_right: Point2,
}

impl TextureBox {
    /// Normalize a pixel box (origin top-left) against the texture size
    pub fn from_pixels(x1: f64, y1: f64, x2: f64, y2: f64, size: ImageSize) -> Self {
        let (width, height) = (size.width_f(), size.height_f());
        Self {
            upper_left: Point2::new(x1 / width, 1.0 - y1 / height),
            lower_right: Point2::new(x2 / width, 1.0 - y2 / height),
        }
    }

    /// The four corners, in order top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [Point2; 4] {
        let (ul, br) = (self.upper_left, self.lower_right);
        [
            ul,
            Point2::new(br.x, ul.y),
            br,
            Point2::new(ul.x, br.y),
        ]
    }
}

/// Everything the layout produced for one texture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureLayout {
    /// Boxes of every placed glyph occurrence, grouped by glyph
    pub boxes: BTreeMap<char, Vec<TextureBox>>,
    /// Height in pixels from the top of the text block to the bottom of the last line
    pub occupied_height: f64,
    /// Text of each line, top to bottom
    pub lines: Vec<String>,
    /// Page the layout was made for
    pub page: PageGeometry,
    /// Parameters the layout used
    pub params: LayoutParams,
    /// Font the layout was measured with
    pub font: FontDescriptor,
}

impl TextureLayout {
    /// Number of placed glyphs
    pub fn glyph_count(&self) -> usize {
        self.boxes.values().map(Vec::len).sum()
    }

    /// Every box with its glyph, in glyph order
    pub fn iter_boxes(&self) -> impl Iterator<Item = (char, &TextureBox)> {
        self.boxes
            .iter()
            .flat_map(|(&glyph, boxes)| boxes.iter().map(move |b| (glyph, b)))
    }
}

/// Measures strings with kerning applied between glyphs
#[derive(Debug, Clone, Copy)]
pub struct TextSizer<'a> {
    table: &'a GlyphMetricsTable,
    kerning: f64,
}

impl<'a> TextSizer<'a> {
    /// Create a sizer over a font's metrics table
    pub const fn new(table: &'a GlyphMetricsTable, kerning: f64) -> Self {
        Self { table, kerning }
    }

    /// Kerning multiplier in use
    pub const fn kerning(&self) -> f64 {
        self.kerning
    }

    /// `(width, height)` of `text` in pixels
    ///
    /// Every glyph but the last contributes its kerned advance; the last one
    /// has nothing to kern against and contributes its plain advance. Height
    /// is the tallest glyph.
    pub fn measure(&self, text: &str) -> FontResult<(f64, f64)> {
        let mut width = 0.0;
        let mut height = 0.0f64;
        let mut glyphs = text.chars().peekable();

        while let Some(glyph) = glyphs.next() {
            let metrics = self.table.get(glyph)?;
            width += if glyphs.peek().is_some() {
                metrics.advance() * self.kerning
            } else {
                metrics.advance()
            };
            height = height.max(metrics.height());
        }

        Ok((width, height))
    }
}

/// Layout engine driving a glyph stream
#[derive(Debug, Clone)]
pub struct TextLayout<R> {
    stream: GlyphStream<R>,
    line_height: LineHeight,
}

impl<R: Rng> TextLayout<R> {
    /// Create a layout engine over a glyph stream
    pub fn new(stream: GlyphStream<R>) -> Self {
        Self {
            stream,
            line_height: LineHeight::PerLine,
        }
    }

    /// Choose how the line pitch is measured
    pub fn with_line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height;
        self
    }

    /// Build one line no wider than `max_width` (unless a single word is)
    ///
    /// The sizer's kerning must be positive and finite, otherwise the line
    /// width never grows toward the bound.
    pub fn next_line(
        &mut self,
        sizer: &TextSizer<'_>,
        font: &FontDescriptor,
        max_width: f64,
    ) -> LayoutResult<String> {
        let kerning = sizer.kerning();
        if !(kerning.is_finite() && kerning > 0.0) {
            return Err(LayoutError::InvalidKerning(kerning));
        }
        if !max_width.is_finite() {
            return Err(LayoutError::InvalidWidth(max_width));
        }
        let mut line = String::new();

        loop {
            let word: String = self
                .stream
                .next_word()
                .chars()
                .map(|g| font.resolve_glyph(g))
                .collect();

            let candidate = format!("{line}{word}");
            let (width, _) = sizer.measure(&candidate)?;
            if width >= max_width {
                if line.is_empty() {
                    line = candidate;
                }
                break;
            }
            line = candidate;
        }

        if line.ends_with(' ') {
            line.pop();
        }
        Ok(line)
    }

    /// Fill `page` with lines of text and collect every glyph's box
    pub fn layout(
        &mut self,
        table: &GlyphMetricsTable,
        font: &FontDescriptor,
        page: PageGeometry,
        params: LayoutParams,
    ) -> LayoutResult<TextureLayout> {
        params.validate()?;
        let sizer = TextSizer::new(table, params.kerning);
        let padding = page.padding_px();
        let max_width = page.max_width();
        let max_height = page.max_height();

        let mut pixel_boxes: BTreeMap<char, Vec<[f64; 4]>> = BTreeMap::new();
        let mut lines = Vec::new();
        let mut cursor_y = 0.0;
        let mut occupied_height = 0.0;

        loop {
            let line = self.next_line(&sizer, font, max_width)?;
            let line_height = match self.line_height {
                LineHeight::PerLine => sizer.measure(&line)?.1,
                LineHeight::FontMax => table.max_glyph_height(),
            };

            if cursor_y + line_height > max_height || line_height <= 0.0 {
                break;
            }

            let top = padding + cursor_y;
            let mut cursor_x = padding;
            for glyph in line.chars() {
                let m = table.get(glyph)?;
                pixel_boxes.entry(glyph).or_default().push([
                    cursor_x + m.x1,
                    top + m.y1,
                    cursor_x + m.x2,
                    top + m.y2,
                ]);
                cursor_x += m.advance() * params.kerning;
            }

            occupied_height = cursor_y + line_height;
            cursor_y += line_height * params.line_spacing;
            lines.push(line);
        }

        let boxes: BTreeMap<char, Vec<TextureBox>> = pixel_boxes
            .into_iter()
            .map(|(glyph, boxes)| {
                let normalized = boxes
                    .into_iter()
                    .map(|[x1, y1, x2, y2]| TextureBox::from_pixels(x1, y1, x2, y2, page.image_size))
                    .collect();
                (glyph, normalized)
            })
            .collect();

        log::debug!(
            "Laid out {} lines ({} glyphs) in {:.0}px of {:.0}px, font '{}'",
            lines.len(),
            boxes.values().map(Vec::len).sum::<usize>(),
            occupied_height,
            max_height,
            font.name
        );

        Ok(TextureLayout {
            boxes,
            occupied_height,
            lines,
            page,
            params,
            font: font.clone(),
        })
    }
}
