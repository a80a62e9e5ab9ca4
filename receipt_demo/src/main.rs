//! Receipt synthesis demo
//!
//! Runs a batch against a built-in renderer: the receipt is a subdivided
//! sheet bent around a vertical axis and filmed by a perspective camera.
//! One JSON annotation file is written per frame.
//!
//! Usage: `receipt_demo [config.toml|config.ron]`

use std::path::Path;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use receipt_synth::foundation::logging;
use receipt_synth::foundation::math::utils;
use receipt_synth::pipeline::BatchError;
use receipt_synth::prelude::*;
use receipt_synth::text::FontError;

const DEFAULT_CONFIG: &str = "receipt_demo.toml";

#[derive(Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Font error: {0}")]
    Font(#[from] FontError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}

/// Demo settings on top of the library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    synth: SynthConfig,
    /// TrueType/OpenType files; empty means synthetic monospace metrics
    font_files: Vec<String>,
    /// Pixel size fonts are rendered at
    font_size_px: f32,
    /// Undeformed sheet `(width, height)` in world units
    sheet_size: (f64, f64),
    /// Sheet subdivision `(cols, rows)`
    sheet_cells: (usize, usize),
    /// Total bend angle across the sheet width, radians
    bend_range: (f64, f64),
    /// Camera distance from the sheet center
    camera_distance_range: (f64, f64),
    /// Camera offset in X and Y
    camera_jitter: f64,
    /// Vertical field of view in degrees
    fov_y_degrees: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            synth: SynthConfig {
                batch: BatchConfig::new().with_frames(4).with_render_size(720, 1280),
                ..SynthConfig::default()
            },
            font_files: Vec::new(),
            font_size_px: 28.0,
            sheet_size: (1.0, 1.6),
            sheet_cells: (32, 48),
            bend_range: (0.0, 1.2),
            camera_distance_range: (2.3, 2.9),
            camera_jitter: 0.05,
            fov_y_degrees: 45.0,
        }
    }
}

impl Config for DemoConfig {}

/// Bent sheet under a perspective camera
struct SheetRenderer {
    sheet_size: (f64, f64),
    sheet_cells: (usize, usize),
    bend_range: (f64, f64),
    camera_distance_range: (f64, f64),
    camera_jitter: f64,
    fov_y: f64,
    render_size: ImageSize,
}

impl SheetRenderer {
    fn new(config: &DemoConfig) -> Self {
        Self {
            sheet_size: config.sheet_size,
            sheet_cells: config.sheet_cells,
            bend_range: config.bend_range,
            camera_distance_range: config.camera_distance_range,
            camera_jitter: config.camera_jitter,
            fov_y: utils::deg_to_rad(config.fov_y_degrees),
            render_size: config.synth.batch.render_size,
        }
    }
}

impl FrameRenderer for SheetRenderer {
    fn surface_size(&self) -> (f64, f64) {
        self.sheet_size
    }

    fn render(
        &mut self,
        layout: &TextureLayout,
        font: &FontDescriptor,
        rng: &mut StdRng,
    ) -> Result<RenderedFrame, FrameError> {
        let (width, height) = self.sheet_size;
        let (cols, rows) = self.sheet_cells;
        let mut mesh = UvMesh::sheet(cols, rows, width, height);

        // Wrap the sheet onto a cylinder whose axis is parallel to Y
        let bend = utils::sample_range(rng, self.bend_range);
        if bend.abs() > 1e-6 {
            let radius = width / bend;
            mesh.deform(|p| {
                let angle = p.x / radius;
                Point3::new(radius * angle.sin(), p.y, radius * (angle.cos() - 1.0))
            });
        }

        let jitter = (-self.camera_jitter.abs(), self.camera_jitter.abs());
        let position = Vec3::new(
            utils::sample_range(rng, jitter),
            utils::sample_range(rng, jitter),
            utils::sample_range(rng, self.camera_distance_range),
        );
        let camera = Camera::perspective(position, self.fov_y, self.render_size.aspect())
            .look_at(Vec3::zeros(), Vec3::y());

        log::debug!(
            "Rendering {} lines in '{}' on a sheet bent by {bend:.3} rad, camera at {:?}",
            layout.lines.len(),
            font.name,
            position
        );

        Ok(RenderedFrame {
            mesh,
            camera: Box::new(camera),
            render_size: self.render_size,
        })
    }
}

fn run<P: GlyphMetricsProvider>(
    config: &DemoConfig,
    fonts: Vec<FontDescriptor>,
    provider: P,
) -> Result<BatchSummary, DemoError> {
    let renderer = SheetRenderer::new(config);
    let mut runner = BatchRunner::new(config.synth.clone(), fonts, provider, renderer)?;
    Ok(runner.run_to_dir()?)
}

fn run_demo(config_path: &str) -> Result<BatchSummary, DemoError> {
    let config = DemoConfig::load_or_default(config_path)?;
    let size = config.font_size_px;

    if config.font_files.is_empty() {
        log::info!("No font files configured, using synthetic monospace metrics");
        let advance = f64::from(size) * 0.6;
        let provider = FixedMetrics::monospace(advance, f64::from(size));
        let fonts = vec![
            FontDescriptor::new("mono", size),
            FontDescriptor::new("mono-caps", size).uppercase_only(),
        ];
        return run(&config, fonts, provider);
    }

    let mut provider = FontdueMetrics::new();
    let mut fonts = Vec::with_capacity(config.font_files.len());
    for file in &config.font_files {
        let name = provider.register_file(Path::new(file))?;
        fonts.push(FontDescriptor::new(name, size));
    }
    run(&config, fonts, provider)
}

fn main() {
    logging::init("info");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    match run_demo(&config_path) {
        Ok(summary) => log::info!(
            "Wrote {} frames with {} annotations ({} glyphs dropped)",
            summary.frames,
            summary.totals.annotations,
            summary.totals.dropped()
        ),
        Err(e) => {
            log::error!("Demo failed: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn layout() -> TextureLayout {
        let font = FontDescriptor::new("mono", 20.0);
        let provider = FixedMetrics::monospace(12.0, 20.0);
        let table = receipt_synth::text::GlyphMetricsTable::build(
            &provider,
            &font,
            &receipt_synth::text::glyphs::print_glyphs(),
        )
        .unwrap();
        TextLayout::new(GlyphStream::new(StdRng::seed_from_u64(1)))
            .layout(&table, &font, PageGeometry::new(ImageSize::new(200, 320)), LayoutParams::default())
            .unwrap()
    }

    #[test]
    fn test_negative_jitter_is_treated_as_its_magnitude() {
        let config = DemoConfig {
            camera_jitter: -0.2,
            ..DemoConfig::default()
        };
        let mut renderer = SheetRenderer::new(&config);
        let font = FontDescriptor::new("mono", 20.0);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let frame = renderer.render(&layout(), &font, &mut rng).unwrap();
            assert_eq!(frame.render_size, config.synth.batch.render_size);
        }
    }

    #[test]
    fn test_zero_jitter_and_flat_sheet() {
        let config = DemoConfig {
            camera_jitter: 0.0,
            bend_range: (0.0, 0.0),
            ..DemoConfig::default()
        };
        let mut renderer = SheetRenderer::new(&config);
        let font = FontDescriptor::new("mono", 20.0);
        let frame = renderer
            .render(&layout(), &font, &mut StdRng::seed_from_u64(5))
            .unwrap();

        let center = frame.camera.world_to_camera(&Point3::origin());
        assert!((center.x - 0.5).abs() < 1e-9 && (center.y - 0.5).abs() < 1e-9);
    }
}
