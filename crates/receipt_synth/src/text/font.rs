//! Font descriptors and glyph metrics
//!
//! Glyph rasterization is not done here. A [`GlyphMetricsProvider`] reports,
//! for a glyph drawn with its cell's top-left corner at the origin, the
//! pixel-tight box around the inked content. Tables of those boxes are built
//! once per font and cached.

use std::collections::HashMap;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use serde::{Deserialize, Serialize};

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Failed to load font from file or data
    #[error("Failed to load font: {0}")]
    LoadError(String),

    /// No font registered under this name
    #[error("Unknown font '{0}'")]
    UnknownFont(String),

    /// The font has no glyph for this character
    #[error("Font '{font}' has no glyph for '{glyph}'")]
    MissingGlyph {
        /// Requested character
        glyph: char,
        /// Font name
        font: String,
    },

    /// There are no fonts to pick from
    #[error("No fonts available")]
    NoFonts,
}

/// Identity and capabilities of a font
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Name the metrics provider knows the font by
    pub name: String,
    /// Rendering size in pixels
    pub size_px: f32,
    /// Whether the font has distinct lowercase glyphs
    pub supports_lowercase: bool,
}

impl FontDescriptor {
    /// Create a descriptor for a font with full case support
    pub fn new(name: impl Into<String>, size_px: f32) -> Self {
        Self {
            name: name.into(),
            size_px,
            supports_lowercase: true,
        }
    }

    /// Mark the font as uppercase-only
    pub fn uppercase_only(mut self) -> Self {
        self.supports_lowercase = false;
        self
    }

    /// Map a glyph to the form this font actually prints
    pub fn resolve_glyph(&self, glyph: char) -> char {
        if self.supports_lowercase {
            glyph
        } else {
            glyph.to_ascii_uppercase()
        }
    }
}

/// Tight pixel box of a glyph drawn at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphMetrics {
    /// Left edge of the inked content
    pub x1: f64,
    /// Top edge of the inked content
    pub y1: f64,
    /// Right edge of the inked content; also the glyph's advance
    pub x2: f64,
    /// Bottom edge of the inked content
    pub y2: f64,
}

impl GlyphMetrics {
    /// Create metrics from box edges
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Inked width
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Inked height
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Horizontal advance before kerning.
    ///
    /// The right edge rather than the inked width: the glyph's cell starts
    /// left of `x1`.
    pub fn advance(&self) -> f64 {
        self.x2
    }
}

/// Source of per-glyph tight boxes
///
/// Must be deterministic for a fixed (glyph, font) pair.
pub trait GlyphMetricsProvider {
    /// Tight box of `glyph` rendered with `font`
    fn metrics(&self, glyph: char, font: &FontDescriptor) -> FontResult<GlyphMetrics>;
}

impl<P: GlyphMetricsProvider + ?Sized> GlyphMetricsProvider for &P {
    fn metrics(&self, glyph: char, font: &FontDescriptor) -> FontResult<GlyphMetrics> {
        (**self).metrics(glyph, font)
    }
}

/// Metrics of a whole alphabet for one font
#[derive(Debug, Clone)]
pub struct GlyphMetricsTable {
    font: String,
    glyphs: HashMap<char, GlyphMetrics>,
    max_glyph_height: f64,
}

impl GlyphMetricsTable {
    /// Measure every glyph of `alphabet`, after case resolution for `font`
    pub fn build<P: GlyphMetricsProvider + ?Sized>(
        provider: &P,
        font: &FontDescriptor,
        alphabet: &str,
    ) -> FontResult<Self> {
        let mut glyphs = HashMap::new();
        let mut max_glyph_height = 0.0f64;

        for glyph in alphabet.chars().map(|g| font.resolve_glyph(g)) {
            if glyphs.contains_key(&glyph) {
                continue;
            }
            let metrics = provider.metrics(glyph, font)?;
            max_glyph_height = max_glyph_height.max(metrics.height());
            glyphs.insert(glyph, metrics);
        }

        log::debug!(
            "Measured {} glyphs for font '{}' (tallest {:.1}px)",
            glyphs.len(),
            font.name,
            max_glyph_height
        );

        Ok(Self {
            font: font.name.clone(),
            glyphs,
            max_glyph_height,
        })
    }

    /// Metrics of one glyph
    pub fn get(&self, glyph: char) -> FontResult<&GlyphMetrics> {
        self.glyphs.get(&glyph).ok_or_else(|| FontError::MissingGlyph {
            glyph,
            font: self.font.clone(),
        })
    }

    /// Height of the tallest glyph in the table
    pub fn max_glyph_height(&self) -> f64 {
        self.max_glyph_height
    }

    /// Name of the font the table was measured for
    pub fn font_name(&self) -> &str {
        &self.font
    }

    /// Number of measured glyphs
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Identity of a measured font: name, pixel size bits and case support
type FontKey = (String, u32, bool);

fn font_key(font: &FontDescriptor) -> FontKey {
    (font.name.clone(), font.size_px.to_bits(), font.supports_lowercase)
}

/// Per-font cache of metrics tables
///
/// Descriptors that share a name but differ in size or case support get
/// separate tables.
#[derive(Debug, Default)]
pub struct MetricsCache {
    tables: HashMap<FontKey, Arc<GlyphMetricsTable>>,
}

impl MetricsCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table for `font`, measuring `alphabet` on first use
    pub fn get_or_build<P: GlyphMetricsProvider + ?Sized>(
        &mut self,
        provider: &P,
        font: &FontDescriptor,
        alphabet: &str,
    ) -> FontResult<Arc<GlyphMetricsTable>> {
        let key = font_key(font);
        if let Some(table) = self.tables.get(&key) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(GlyphMetricsTable::build(provider, font, alphabet)?);
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Table-driven metrics with a fallback box
///
/// Same box for every font; handy for synthetic monospace text.
#[derive(Debug, Clone)]
pub struct FixedMetrics {
    default: GlyphMetrics,
    overrides: HashMap<char, GlyphMetrics>,
}

impl FixedMetrics {
    /// Every glyph fills an `advance` x `height` cell
    pub fn monospace(advance: f64, height: f64) -> Self {
        Self {
            default: GlyphMetrics::new(0.0, 0.0, advance, height),
            overrides: HashMap::new(),
        }
    }

    /// Use specific metrics for one glyph
    pub fn with_glyph(mut self, glyph: char, metrics: GlyphMetrics) -> Self {
        self.overrides.insert(glyph, metrics);
        self
    }
}

impl GlyphMetricsProvider for FixedMetrics {
    fn metrics(&self, glyph: char, _font: &FontDescriptor) -> FontResult<GlyphMetrics> {
        Ok(self.overrides.get(&glyph).copied().unwrap_or(self.default))
    }
}

/// Metrics measured from real font outlines with `fontdue`
///
/// Boxes are relative to a cell whose top is the font's ascent line, so
/// glyphs of one line share a baseline.
#[derive(Default)]
pub struct FontdueMetrics {
    fonts: HashMap<String, Font>,
}

impl FontdueMetrics {
    /// Create a provider with no fonts
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font from raw TrueType/OpenType bytes
    pub fn register(&mut self, name: impl Into<String>, font_data: &[u8]) -> FontResult<()> {
        let name = name.into();
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| FontError::LoadError(format!("fontdue error for '{name}': {e}")))?;
        log::info!("Registered font '{name}'");
        self.fonts.insert(name, font);
        Ok(())
    }

    /// Register a font file under its file name
    pub fn register_file(&mut self, path: &std::path::Path) -> FontResult<String> {
        let bytes = std::fs::read(path)
            .map_err(|e| FontError::LoadError(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.register(name.clone(), &bytes)?;
        Ok(name)
    }

    /// Names of registered fonts
    pub fn font_names(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }
}

impl GlyphMetricsProvider for FontdueMetrics {
    fn metrics(&self, glyph: char, font: &FontDescriptor) -> FontResult<GlyphMetrics> {
        let face = self
            .fonts
            .get(&font.name)
            .ok_or_else(|| FontError::UnknownFont(font.name.clone()))?;

        if glyph != ' ' && face.lookup_glyph_index(glyph) == 0 {
            return Err(FontError::MissingGlyph {
                glyph,
                font: font.name.clone(),
            });
        }

        let metrics = face.metrics(glyph, font.size_px);
        let (ascent, descent) = face
            .horizontal_line_metrics(font.size_px)
            .map_or((font.size_px, 0.0), |line| (line.ascent, line.descent));

        // Blank glyphs have no ink; their box is the whole cell
        if metrics.width == 0 || metrics.height == 0 {
            return Ok(GlyphMetrics::new(
                0.0,
                0.0,
                f64::from(metrics.advance_width),
                f64::from(ascent - descent),
            ));
        }

        let x1 = f64::from(metrics.xmin);
        let bottom = f64::from(ascent) - f64::from(metrics.ymin);
        Ok(GlyphMetrics::new(
            x1,
            bottom - metrics.height as f64,
            x1 + metrics.width as f64,
            bottom,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts calls so caching can be observed
    struct CountingMetrics {
        calls: std::cell::Cell<usize>,
    }

    impl GlyphMetricsProvider for CountingMetrics {
        fn metrics(&self, glyph: char, _font: &FontDescriptor) -> FontResult<GlyphMetrics> {
            self.calls.set(self.calls.get() + 1);
            let height = if glyph.is_ascii_lowercase() { 8.0 } else { 12.0 };
            Ok(GlyphMetrics::new(1.0, 2.0, 10.0, 2.0 + height))
        }
    }

    #[test]
    fn test_uppercase_only_resolution() {
        let font = FontDescriptor::new("caps", 20.0).uppercase_only();
        assert_eq!(font.resolve_glyph('q'), 'Q');
        assert_eq!(font.resolve_glyph('Q'), 'Q');
        assert_eq!(font.resolve_glyph('7'), '7');
        assert_eq!(font.resolve_glyph('%'), '%');

        let mixed = FontDescriptor::new("mixed", 20.0);
        assert_eq!(mixed.resolve_glyph('q'), 'q');
    }

    #[test]
    fn test_table_for_uppercase_font_has_no_lowercase() {
        let provider = CountingMetrics { calls: std::cell::Cell::new(0) };
        let font = FontDescriptor::new("caps", 20.0).uppercase_only();
        let table = GlyphMetricsTable::build(&provider, &font, "abcABC").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(provider.calls.get(), 3);
        assert!(matches!(table.get('a'), Err(FontError::MissingGlyph { glyph: 'a', .. })));
        assert_eq!(table.max_glyph_height(), 12.0);
    }

    #[test]
    fn test_cache_measures_each_font_once() {
        let provider = CountingMetrics { calls: std::cell::Cell::new(0) };
        let mut cache = MetricsCache::new();
        let font = FontDescriptor::new("mono", 20.0);

        let first = cache.get_or_build(&provider, &font, "ab").unwrap();
        let second = cache.get_or_build(&provider, &font, "ab").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.get(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_separates_sizes_and_case_support() {
        let provider = CountingMetrics { calls: std::cell::Cell::new(0) };
        let mut cache = MetricsCache::new();
        let small = FontDescriptor::new("mono", 12.0);
        let large = FontDescriptor::new("mono", 24.0);
        let caps = FontDescriptor::new("mono", 12.0).uppercase_only();

        let a = cache.get_or_build(&provider, &small, "aB").unwrap();
        let b = cache.get_or_build(&provider, &large, "aB").unwrap();
        let c = cache.get_or_build(&provider, &caps, "aB").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 3);
        assert!(c.get('a').is_err());
        assert!(a.get('a').is_ok());

        let again = cache.get_or_build(&provider, &small, "aB").unwrap();
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[test]
    fn test_fixed_metrics_override() {
        let dot = GlyphMetrics::new(3.0, 14.0, 6.0, 17.0);
        let provider = FixedMetrics::monospace(10.0, 20.0).with_glyph('.', dot);
        let font = FontDescriptor::new("any", 20.0);

        assert_eq!(provider.metrics('.', &font).unwrap(), dot);
        assert_eq!(provider.metrics('x', &font).unwrap().advance(), 10.0);
        assert_eq!(provider.metrics('x', &font).unwrap().height(), 20.0);
    }

    #[test]
    fn test_fontdue_unknown_font() {
        let provider = FontdueMetrics::new();
        let err = provider.metrics('a', &FontDescriptor::new("missing.ttf", 20.0)).unwrap_err();
        assert!(matches!(err, FontError::UnknownFont(_)));
    }

    #[test]
    fn test_fontdue_rejects_garbage_bytes() {
        let mut provider = FontdueMetrics::new();
        let err = provider.register("bad.ttf", &[0u8; 16]).unwrap_err();
        assert!(matches!(err, FontError::LoadError(_)));
    }
}
