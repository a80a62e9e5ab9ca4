//! # Unified Configuration
//!
//! All tunables of a synthesis run in one serializable tree. Loaded from TOML
//! or RON through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Layout**: page padding, random line spacing and kerning, word length
//! - **Projection**: face containment tolerance, fallback scan, quadtree shape
//! - **Filter**: accepted aspect ratio band for recovered boxes
//! - **Batch**: frame count, seed, retry policy, render size, output directory

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::ImageSize;
use crate::spatial::QuadtreeConfig;
use crate::text::glyphs::AVERAGE_WORD_LENGTH;
use crate::text::layout::LineHeight;

/// # Layout Configuration
///
/// Controls how the text block is packed into the receipt texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Blank margin on every side, as a fraction of the texture width
    pub padding: f64,
    /// Range line spacing is sampled from, per frame
    pub line_spacing_range: (f64, f64),
    /// Range kerning is sampled from, per frame
    pub kerning_range: (f64, f64),
    /// Which glyph height sets the line pitch
    pub line_height: LineHeight,
    /// Average natural word length; sets how often a space is drawn
    pub average_word_length: f64,
}

impl LayoutConfig {
    /// Create a layout configuration with the stock receipt parameters
    pub fn new() -> Self {
        Self {
            padding: 0.04,
            line_spacing_range: (0.9, 1.1),
            kerning_range: (0.95, 1.05),
            line_height: LineHeight::PerLine,
            average_word_length: AVERAGE_WORD_LENGTH,
        }
    }

    /// Set the page padding fraction
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Set the line height mode
    pub fn with_line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..0.5).contains(&self.padding) {
            return Err(ConfigError::Invalid(format!(
                "padding must be in [0, 0.5), got {}",
                self.padding
            )));
        }
        for (name, range) in [
            ("line_spacing_range", self.line_spacing_range),
            ("kerning_range", self.kerning_range),
        ] {
            if range.0 <= 0.0 || range.1 < range.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive and ordered, got {range:?}"
                )));
            }
        }
        if self.average_word_length <= 2.0 {
            return Err(ConfigError::Invalid(format!(
                "average_word_length must exceed 2, got {}",
                self.average_word_length
            )));
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Projection Configuration
///
/// Controls how texture-space points are located on the deformed mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Slack allowed outside `[0, 1]` for each barycentric weight
    pub containment_epsilon: f64,
    /// Scan every face when the nearest-vertex candidates miss the point
    pub fallback_scan: bool,
    /// Shape of the UV quadtree
    pub quadtree: QuadtreeConfig,
}

impl ProjectionConfig {
    /// Create a projection configuration with defaults
    pub fn new() -> Self {
        Self {
            containment_epsilon: 1e-9,
            fallback_scan: false,
            quadtree: QuadtreeConfig::default(),
        }
    }

    /// Enable or disable the exhaustive face scan
    pub fn with_fallback_scan(mut self, enabled: bool) -> Self {
        self.fallback_scan = enabled;
        self
    }

    /// Set the containment tolerance
    pub fn with_containment_epsilon(mut self, epsilon: f64) -> Self {
        self.containment_epsilon = epsilon;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1e-3).contains(&self.containment_epsilon) {
            return Err(ConfigError::Invalid(format!(
                "containment_epsilon must be in [0, 1e-3), got {}",
                self.containment_epsilon
            )));
        }
        if self.quadtree.max_samples_per_node == 0 {
            return Err(ConfigError::Invalid(
                "quadtree.max_samples_per_node must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Filter Configuration
///
/// Recovered boxes whose width/height ratio falls outside this band are
/// dropped. The defaults are empirical and should not be changed without
/// recalibrating against real renders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Widest accepted width/height ratio
    pub max_aspect_ratio: f64,
    /// Narrowest accepted width/height ratio
    pub min_aspect_ratio: f64,
}

impl FilterConfig {
    /// Create a filter configuration with the stock thresholds
    pub fn new() -> Self {
        Self {
            max_aspect_ratio: 3.0,
            min_aspect_ratio: 1.0 / 15.0,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_aspect_ratio <= 0.0 || self.max_aspect_ratio < self.min_aspect_ratio {
            return Err(ConfigError::Invalid(format!(
                "aspect band must be positive and ordered, got [{}, {}]",
                self.min_aspect_ratio, self.max_aspect_ratio
            )));
        }
        Ok(())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Batch Configuration
///
/// Drives a run of independent frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of frames to produce
    pub frames: u64,
    /// Base seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// Extra attempts (with fresh seeds) for a frame that fails fatally
    pub max_retries: u32,
    /// Directory annotation files are written to
    pub output_dir: String,
    /// Size of the rendered image; the texture takes its width
    pub render_size: ImageSize,
}

impl BatchConfig {
    /// Create a batch configuration with defaults
    pub fn new() -> Self {
        Self {
            frames: 1,
            seed: None,
            max_retries: 2,
            output_dir: "output".to_string(),
            render_size: ImageSize::new(1440, 2560),
        }
    }

    /// Set the number of frames
    pub fn with_frames(mut self, frames: u64) -> Self {
        self.frames = frames;
        self
    }

    /// Set a fixed base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the retry budget per frame
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the render size
    pub fn with_render_size(mut self, width: u32, height: u32) -> Self {
        self.render_size = ImageSize::new(width, height);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render_size.width == 0 || self.render_size.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "render size must be non-zero, got {}x{}",
                self.render_size.width, self.render_size.height
            )));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Synthesis Configuration
///
/// Top-level configuration that encompasses every stage of a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Text layout settings
    pub layout: LayoutConfig,
    /// UV projection settings
    pub projection: ProjectionConfig,
    /// Aspect ratio filter
    pub filter: FilterConfig,
    /// Batch driver settings
    pub batch: BatchConfig,
}

impl SynthConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.projection.validate()?;
        self.filter.validate()?;
        self.batch.validate()?;
        Ok(())
    }
}

impl Config for SynthConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SynthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SynthConfig {
            batch: BatchConfig::new().with_frames(12).with_seed(7),
            projection: ProjectionConfig::new().with_fallback_scan(true),
            ..SynthConfig::default()
        };

        let text = config.to_string_with_format("synth.toml").unwrap();
        let parsed = SynthConfig::from_str_with_format(&text, "synth.toml").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = SynthConfig {
            layout: LayoutConfig::new().with_line_height(LineHeight::FontMax),
            ..SynthConfig::default()
        };

        let text = config.to_string_with_format("synth.ron").unwrap();
        let parsed = SynthConfig::from_str_with_format(&text, "synth.ron").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = SynthConfig::from_str_with_format("[batch]\nframes = 3\n", "a.toml").unwrap();
        assert_eq!(parsed.batch.frames, 3);
        assert_eq!(parsed.filter, FilterConfig::default());
    }

    #[test]
    fn test_unsupported_format() {
        let err = SynthConfig::from_str_with_format("", "synth.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_filter_band() {
        let config = SynthConfig {
            filter: FilterConfig { max_aspect_ratio: 0.01, min_aspect_ratio: 0.1 },
            ..SynthConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
