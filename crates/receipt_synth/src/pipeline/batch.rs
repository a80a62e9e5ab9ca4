//! # Batch Driver
//!
//! Runs a sequence of independent frames. Each frame draws everything random
//! (font, layout parameters, text, scene) from its own seed, so any frame can
//! be reproduced on its own from the base seed and its index.
//!
//! ## Failure Policy
//! Per-glyph problems are counted in the [`FrameReport`]. A frame-fatal
//! error (renderer failure, missing glyph metrics) is logged and the frame is
//! retried with a fresh seed, up to `max_retries` times, before the batch
//! aborts.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::frame::{FrameAnnotator, FrameError, FrameOutput, FrameRenderer, FrameReport};
use crate::annotate::AnnotationError;
use crate::config::ConfigError;
use crate::core::config::SynthConfig;
use crate::text::glyphs::print_glyphs;
use crate::text::{
    FontDescriptor, FontError, GlyphMetricsProvider, GlyphStream, LayoutParams, MetricsCache,
    PageGeometry, TextLayout,
};

/// Batch-fatal errors
#[derive(Error, Debug)]
pub enum BatchError {
    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// No usable font
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// A frame kept failing after every retry
    #[error("Frame {frame} failed after {attempts} attempts: {source}")]
    FrameFailed {
        /// Frame index
        frame: u64,
        /// Attempts made
        attempts: u32,
        /// Error of the last attempt
        #[source]
        source: FrameError,
    },

    /// A frame's output could not be stored
    #[error("Output error: {0}")]
    Output(#[from] AnnotationError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Totals over a whole batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Frames completed
    pub frames: u64,
    /// Failed attempts that were retried
    pub retries: u64,
    /// Summed per-frame counters
    pub totals: FrameReport,
}

/// Seed of attempt `attempt` of frame `frame`
pub fn frame_seed(base: u64, frame: u64, attempt: u32) -> u64 {
    base.wrapping_add(frame).wrapping_add(u64::from(attempt) << 32)
}

/// Drives layout, rendering and annotation over many frames
pub struct BatchRunner<P, R> {
    config: SynthConfig,
    fonts: Vec<FontDescriptor>,
    provider: P,
    renderer: R,
    cache: MetricsCache,
    annotator: FrameAnnotator,
    base_seed: u64,
}

impl<P: GlyphMetricsProvider, R: FrameRenderer> BatchRunner<P, R> {
    /// Create a runner; fails on an invalid configuration or an empty font list
    pub fn new(
        config: SynthConfig,
        fonts: Vec<FontDescriptor>,
        provider: P,
        renderer: R,
    ) -> Result<Self, BatchError> {
        config.validate()?;
        if fonts.is_empty() {
            return Err(FontError::NoFonts.into());
        }

        let base_seed = config.batch.seed.unwrap_or_else(rand::random);
        log::info!(
            "Batch of {} frames, base seed {}, {} fonts",
            config.batch.frames,
            base_seed,
            fonts.len()
        );

        Ok(Self {
            annotator: FrameAnnotator::new(&config.projection, &config.filter),
            config,
            fonts,
            provider,
            renderer,
            cache: MetricsCache::new(),
            base_seed,
        })
    }

    /// Seed frame 0 starts from
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Configuration in use
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Produce one frame from `seed`
    pub fn run_frame(&mut self, index: u64, seed: u64) -> Result<FrameOutput, FrameError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout_config = &self.config.layout;

        let font = self.fonts[rng.gen_range(0..self.fonts.len())].clone();
        let table = self.cache.get_or_build(&self.provider, &font, &print_glyphs())?;
        let params = LayoutParams::sample(
            &mut rng,
            layout_config.line_spacing_range,
            layout_config.kerning_range,
        );

        let (surface_width, surface_height) = self.renderer.surface_size();
        let page = PageGeometry::from_aspect(
            self.config.batch.render_size.width,
            surface_width,
            surface_height,
        )?
        .with_padding(layout_config.padding);

        let stream = GlyphStream::with_average_word_length(
            StdRng::seed_from_u64(rng.gen()),
            layout_config.average_word_length,
        );
        let layout = TextLayout::new(stream)
            .with_line_height(layout_config.line_height)
            .layout(&table, &font, page, params)?;

        let frame = self.renderer.render(&layout, &font, &mut rng)?;
        let (annotations, report) = self.annotator.annotate(&layout, &frame);

        log::info!(
            "Frame {index}: font '{}', {} glyphs, {} annotations, {} dropped",
            font.name,
            report.glyphs_placed,
            report.annotations,
            report.dropped()
        );

        Ok(FrameOutput {
            index,
            seed,
            layout,
            annotations,
            report,
        })
    }

    /// Run every frame, handing each finished one to `sink`
    pub fn run<F>(&mut self, mut sink: F) -> Result<BatchSummary, BatchError>
    where
        F: FnMut(&FrameOutput) -> Result<(), AnnotationError>,
    {
        let mut summary = BatchSummary::default();
        let max_retries = self.config.batch.max_retries;

        for index in 0..self.config.batch.frames {
            let mut attempt = 0;
            let output = loop {
                let seed = frame_seed(self.base_seed, index, attempt);
                match self.run_frame(index, seed) {
                    Ok(output) => break output,
                    Err(e) if attempt < max_retries => {
                        log::warn!("Frame {index} attempt {} failed: {e}; retrying", attempt + 1);
                        attempt += 1;
                        summary.retries += 1;
                    }
                    Err(e) => {
                        log::error!("Frame {index} failed after {} attempts: {e}", attempt + 1);
                        return Err(BatchError::FrameFailed {
                            frame: index,
                            attempts: attempt + 1,
                            source: e,
                        });
                    }
                }
            };

            sink(&output)?;
            summary.frames += 1;
            summary.totals += output.report;
        }

        log::info!(
            "Batch done: {} frames, {} annotations, {} dropped, {} retries",
            summary.frames,
            summary.totals.annotations,
            summary.totals.dropped(),
            summary.retries
        );
        Ok(summary)
    }

    /// Run every frame and write `frame_NNNNN.json` files into the configured output directory
    pub fn run_to_dir(&mut self) -> Result<BatchSummary, BatchError> {
        let dir = PathBuf::from(&self.config.batch.output_dir);
        std::fs::create_dir_all(&dir)?;
        self.run(|output| output.annotations.write_json(&annotation_path(&dir, output.index)))
    }
}

/// File an annotation set for frame `index` is written to
pub fn annotation_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("frame_{index:05}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BatchConfig;
    use crate::foundation::math::{ImageSize, Vec3};
    use crate::geometry::{Camera, UvMesh};
    use crate::pipeline::RenderedFrame;
    use crate::text::{FixedMetrics, LayoutError, TextureLayout};

    /// Flat sheet seen straight on; fails its first `failures` calls
    struct FlakyRenderer {
        failures: u32,
        calls: u32,
        surface: (f64, f64),
    }

    impl FlakyRenderer {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: 0,
                surface: (1.0, 1.5),
            }
        }
    }

    impl FrameRenderer for FlakyRenderer {
        fn surface_size(&self) -> (f64, f64) {
            self.surface
        }

        fn render(
            &mut self,
            _layout: &TextureLayout,
            _font: &FontDescriptor,
            _rng: &mut StdRng,
        ) -> Result<RenderedFrame, FrameError> {
            self.calls += 1;
            if self.calls <= self.failures {
                return Err(FrameError::Render("scene crashed".to_string()));
            }
            Ok(RenderedFrame {
                mesh: UvMesh::sheet(4, 6, 1.0, 1.5),
                camera: Box::new(Camera::orthographic(Vec3::new(0.0, 0.0, 5.0), 1.5, 1.0 / 1.5)),
                render_size: ImageSize::new(200, 300),
            })
        }
    }

    fn config(frames: u64, retries: u32) -> SynthConfig {
        SynthConfig {
            batch: BatchConfig::new()
                .with_frames(frames)
                .with_seed(77)
                .with_max_retries(retries)
                .with_render_size(200, 300),
            ..SynthConfig::default()
        }
    }

    fn runner(frames: u64, retries: u32, failures: u32) -> BatchRunner<FixedMetrics, FlakyRenderer> {
        BatchRunner::new(
            config(frames, retries),
            vec![FontDescriptor::new("mono", 12.0)],
            FixedMetrics::monospace(6.0, 12.0),
            FlakyRenderer::new(failures),
        )
        .unwrap()
    }

    #[test]
    fn test_frame_seeds_are_distinct() {
        assert_eq!(frame_seed(10, 0, 0), 10);
        assert_ne!(frame_seed(10, 1, 0), frame_seed(10, 0, 1));
        assert_eq!(frame_seed(u64::MAX, 1, 0), 0);
    }

    #[test]
    fn test_batch_runs_every_frame() {
        let mut seen = Vec::new();
        let summary = runner(3, 0, 0)
            .run(|output| {
                seen.push(output.index);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.retries, 0);
        assert!(summary.totals.annotations > 0);
        assert_eq!(
            summary.totals.annotations + summary.totals.dropped(),
            summary.totals.glyphs_placed
        );
    }

    #[test]
    fn test_failed_frame_is_retried() {
        let summary = runner(2, 2, 2).run(|_| Ok(())).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.retries, 2);
    }

    #[test]
    fn test_batch_aborts_after_retry_budget() {
        let err = runner(2, 1, 5).run(|_| Ok(())).unwrap_err();
        match err {
            BatchError::FrameFailed { frame, attempts, .. } => {
                assert_eq!(frame, 0);
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_frames_are_reproducible() {
        let a = runner(1, 0, 0).run_frame(4, 1234).unwrap();
        let b = runner(1, 0, 0).run_frame(4, 1234).unwrap();
        assert_eq!(a.layout, b.layout);
        assert_eq!(a.annotations, b.annotations);
    }

    #[test]
    fn test_degenerate_surface_fails_the_frame() {
        let mut runner = BatchRunner::new(
            config(1, 1),
            vec![FontDescriptor::new("mono", 12.0)],
            FixedMetrics::monospace(6.0, 12.0),
            FlakyRenderer {
                surface: (0.0, 1.5),
                ..FlakyRenderer::new(0)
            },
        )
        .unwrap();

        match runner.run(|_| Ok(())).unwrap_err() {
            BatchError::FrameFailed { attempts, source, .. } => {
                assert_eq!(attempts, 2);
                assert!(matches!(
                    source,
                    FrameError::Layout(LayoutError::DegenerateSurface { .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_font_list_is_rejected() {
        let result = BatchRunner::new(
            config(1, 0),
            Vec::new(),
            FixedMetrics::monospace(6.0, 12.0),
            FlakyRenderer::new(0),
        );
        assert!(matches!(result, Err(BatchError::Font(FontError::NoFonts))));
    }

    #[test]
    fn test_annotation_file_names() {
        assert_eq!(
            annotation_path(Path::new("out"), 42),
            Path::new("out").join("frame_00042.json")
        );
    }
}
