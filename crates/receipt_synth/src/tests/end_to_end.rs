//! Full frames over simple known geometry
//!
//! A flat square whose UVs equal its XY coordinates, filmed straight on by an
//! orthographic camera that frames it exactly, must reproduce the texture
//! boxes in pixel space.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::config::{FilterConfig, ProjectionConfig};
use crate::foundation::math::{ImageSize, Point2, Point3, Vec2, Vec3};
use crate::geometry::{Camera, Face, UvMesh};
use crate::pipeline::{FrameAnnotator, RenderedFrame};
use crate::text::glyphs::print_glyphs;
use crate::text::{
    FixedMetrics, FontDescriptor, GlyphMetrics, GlyphMetricsTable, GlyphStream, LayoutParams,
    PageGeometry, TextLayout, TextureLayout,
};

const SIZE: u32 = 400;

fn unit_square() -> UvMesh {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let uv = |p: &Point3| Point2::new(p.x, p.y);
    let faces = vec![
        Face::new([0, 1, 2], [uv(&positions[0]), uv(&positions[1]), uv(&positions[2])]),
        Face::new([0, 2, 3], [uv(&positions[0]), uv(&positions[2]), uv(&positions[3])]),
    ];
    UvMesh::new(positions, faces).unwrap()
}

fn framing_camera(up: Vec3) -> Camera {
    Camera::orthographic(Vec3::new(0.5, 0.5, 3.0), 1.0, 1.0).look_at(Vec3::new(0.5, 0.5, 0.0), up)
}

fn square_frame(up: Vec3) -> RenderedFrame {
    RenderedFrame {
        mesh: unit_square(),
        camera: Box::new(framing_camera(up)),
        render_size: ImageSize::new(SIZE, SIZE),
    }
}

fn layout(seed: u64) -> TextureLayout {
    let font = FontDescriptor::new("mono", 20.0);
    let provider = FixedMetrics::monospace(10.0, 20.0)
        .with_glyph('.', GlyphMetrics::new(2.0, 14.0, 6.0, 18.0))
        .with_glyph('-', GlyphMetrics::new(1.0, 9.0, 9.0, 11.0));
    let table = GlyphMetricsTable::build(&provider, &font, &print_glyphs()).unwrap();
    let page = PageGeometry::new(ImageSize::new(SIZE, SIZE)).with_padding(0.04);

    TextLayout::new(GlyphStream::new(StdRng::seed_from_u64(seed)))
        .layout(&table, &font, page, LayoutParams::new(1.05, 0.98))
        .unwrap()
}

fn annotator() -> FrameAnnotator {
    FrameAnnotator::new(&ProjectionConfig::default(), &FilterConfig::default())
}

#[test]
fn test_flat_square_reproduces_texture_boxes() {
    let layout = layout(31);
    let (annotations, report) = annotator().annotate(&layout, &square_frame(Vec3::y()));

    assert_eq!(report.face_not_found, 0);
    assert_eq!(report.degenerate_projection, 0);
    assert_eq!(report.annotations + report.dropped(), layout.glyph_count());

    // '-' is 8x2 and wider than 3:1; everything else survives
    let dashes = layout.boxes.get(&'-').map_or(0, Vec::len);
    assert_eq!(report.extreme_aspect, dashes);
    assert_eq!(annotations.len(), layout.glyph_count() - dashes);

    let size = f64::from(SIZE);
    let expected = layout.iter_boxes().filter(|(glyph, _)| *glyph != '-');
    for (annotation, (glyph, texture_box)) in annotations.iter().zip(expected) {
        assert_eq!(annotation.glyph, glyph);

        let ul = Point2::new(texture_box.upper_left.x * size, (1.0 - texture_box.upper_left.y) * size);
        let lr = Point2::new(texture_box.lower_right.x * size, (1.0 - texture_box.lower_right.y) * size);
        assert_relative_eq!(annotation.upper_left, ul, epsilon = 1e-6);
        assert_relative_eq!(annotation.lower_right, lr, epsilon = 1e-6);
        assert_relative_eq!(annotation.width, lr.x - ul.x, epsilon = 1e-6);
        assert_relative_eq!(annotation.height, lr.y - ul.y, epsilon = 1e-6);

        assert_relative_eq!(annotation.corners[0], ul, epsilon = 1e-6);
        assert_relative_eq!(annotation.corners[2], lr, epsilon = 1e-6);
        assert_relative_eq!(annotation.orientation, Vec2::new(1.0, 0.0), epsilon = 1e-9);
    }
}

#[test]
fn test_corner_on_shared_diagonal_is_found() {
    let layout = TextureLayout {
        boxes: [(
            'A',
            vec![crate::text::TextureBox {
                upper_left: Point2::new(0.1, 0.3),
                lower_right: Point2::new(0.2, 0.1),
            }],
        )]
        .into_iter()
        .collect(),
        ..self::layout(1)
    };

    let (annotations, report) = annotator().annotate(&layout, &square_frame(Vec3::y()));
    assert_eq!(report.dropped(), 0);
    assert_eq!(annotations.len(), 1);

    // Bottom-left corner (0.1, 0.1) lies on the diagonal shared by both faces
    let box_ = annotations.as_slice()[0];
    assert_relative_eq!(box_.corners[3], Point2::new(40.0, 360.0), epsilon = 1e-6);
}

#[test]
fn test_rotated_camera_turns_orientation() {
    let layout = layout(5);
    // Image up is world +X, so text runs toward the top of the image
    let (annotations, report) = annotator().annotate(&layout, &square_frame(Vec3::x()));

    assert_eq!(report.face_not_found, 0);
    assert!(!annotations.is_empty());
    for annotation in &annotations {
        assert_relative_eq!(annotation.orientation, Vec2::new(0.0, -1.0), epsilon = 1e-9);
        // Tall glyph cells lie on their side; only '-' is flat enough to stand up
        assert!(annotation.width + 1e-6 >= annotation.height || annotation.glyph == '-');
    }
}

#[test]
fn test_bent_sheet_under_perspective() {
    let layout = layout(9);
    let mut mesh = UvMesh::sheet(24, 36, 2.0, 3.0);
    // Cylindrical bend around the Y axis
    mesh.deform(|p| {
        let angle = p.x / 2.0;
        Point3::new(2.0 * angle.sin(), p.y, 2.0 * (angle.cos() - 1.0))
    });
    let camera = Camera::perspective(Vec3::new(0.3, -0.2, 6.0), 0.7, 2.0 / 3.0);
    let frame = RenderedFrame {
        mesh,
        camera: Box::new(camera),
        render_size: ImageSize::new(SIZE, SIZE * 3 / 2),
    };

    let (annotations, report) = annotator().annotate(&layout, &frame);
    assert_eq!(report.face_not_found, 0);
    assert!(annotations.len() * 10 >= report.glyphs_placed * 9);

    let (width, height) = (f64::from(SIZE), f64::from(SIZE * 3 / 2));
    for annotation in &annotations {
        assert_relative_eq!(annotation.orientation.norm(), 1.0, epsilon = 1e-9);
        assert!(annotation.orientation.x > 0.9);
        assert!(annotation.upper_left.x >= 0.0 && annotation.lower_right.x <= width);
        assert!(annotation.upper_left.y >= 0.0 && annotation.lower_right.y <= height);
        assert!(annotation.upper_left.x <= annotation.lower_right.x);
        assert!(annotation.upper_left.y <= annotation.lower_right.y);
        for corner in &annotation.corners {
            assert!(corner.x >= annotation.upper_left.x - 1e-9);
            assert!(corner.x <= annotation.lower_right.x + 1e-9);
        }
    }
}
