//! Annotation records and their JSON form
//!
//! Each record serializes as a positional tuple
//! `(glyph, (upper_left, lower_right), (width, height), [tl, tr, br, bl], orientation)`
//! with every point as a `[x, y]` pair in pixels.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::{Point2, Vec2};

/// Errors writing or reading annotation files
#[derive(Error, Debug)]
pub enum AnnotationError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type Pair = [f64; 2];

/// Positional wire form of an [`AnnotatedBoundingBox`]
type AnnotationRecord = (char, (Pair, Pair), (f64, f64), [Pair; 4], Pair);

/// Final label for one glyph in the rendered image, all in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "AnnotationRecord", from = "AnnotationRecord")]
pub struct AnnotatedBoundingBox {
    /// Glyph as printed
    pub glyph: char,
    /// Upper-left corner of the axis-aligned box
    pub upper_left: Point2,
    /// Lower-right corner of the axis-aligned box
    pub lower_right: Point2,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Projected corners before rectification, TL, TR, BR, BL
    pub corners: [Point2; 4],
    /// Unit direction of the glyph's baseline
    pub orientation: Vec2,
}

fn pair(p: &Point2) -> Pair {
    [p.x, p.y]
}

impl From<AnnotatedBoundingBox> for AnnotationRecord {
    fn from(b: AnnotatedBoundingBox) -> Self {
        (
            b.glyph,
            (pair(&b.upper_left), pair(&b.lower_right)),
            (b.width, b.height),
            b.corners.map(|c| pair(&c)),
            [b.orientation.x, b.orientation.y],
        )
    }
}

impl From<AnnotationRecord> for AnnotatedBoundingBox {
    fn from((glyph, (ul, lr), (width, height), corners, orientation): AnnotationRecord) -> Self {
        Self {
            glyph,
            upper_left: Point2::from(ul),
            lower_right: Point2::from(lr),
            width,
            height,
            corners: corners.map(Point2::from),
            orientation: Vec2::from(orientation),
        }
    }
}

/// All annotations of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet {
    boxes: Vec<AnnotatedBoundingBox>,
}

impl AnnotationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one annotation
    pub fn push(&mut self, annotation: AnnotatedBoundingBox) {
        self.boxes.push(annotation);
    }

    /// Number of annotations
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Iterate over the annotations
    pub fn iter(&self) -> std::slice::Iter<'_, AnnotatedBoundingBox> {
        self.boxes.iter()
    }

    /// Annotations as a slice
    pub fn as_slice(&self) -> &[AnnotatedBoundingBox] {
        &self.boxes
    }

    /// Compact JSON array of records
    pub fn to_json(&self) -> Result<String, AnnotationError> {
        serde_json::to_string(self).map_err(AnnotationError::from)
    }

    /// Parse a JSON array of records
    pub fn from_json(json: &str) -> Result<Self, AnnotationError> {
        serde_json::from_str(json).map_err(AnnotationError::from)
    }

    /// Write the set to `path` as JSON
    pub fn write_json(&self, path: &Path) -> Result<(), AnnotationError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a AnnotatedBoundingBox;
    type IntoIter = std::slice::Iter<'a, AnnotatedBoundingBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

impl FromIterator<AnnotatedBoundingBox> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = AnnotatedBoundingBox>>(iter: I) -> Self {
        Self {
            boxes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnnotatedBoundingBox {
        AnnotatedBoundingBox {
            glyph: 'Q',
            upper_left: Point2::new(10.0, 20.0),
            lower_right: Point2::new(30.0, 50.0),
            width: 20.0,
            height: 30.0,
            corners: [
                Point2::new(11.0, 20.0),
                Point2::new(30.0, 22.0),
                Point2::new(29.0, 50.0),
                Point2::new(10.0, 48.0),
            ],
            orientation: Vec2::new(1.0, 0.0),
        }
    }

    #[test]
    fn test_record_field_order() {
        let set: AnnotationSet = std::iter::once(sample()).collect();
        let json = set.to_json().unwrap();
        assert_eq!(
            json,
            "[[\"Q\",[[10.0,20.0],[30.0,50.0]],[20.0,30.0],\
             [[11.0,20.0],[30.0,22.0],[29.0,50.0],[10.0,48.0]],[1.0,0.0]]]"
        );
    }

    #[test]
    fn test_json_reads_back() {
        let mut set = AnnotationSet::new();
        set.push(sample());
        set.push(AnnotatedBoundingBox { glyph: '"', ..sample() });

        let parsed = AnnotationSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(parsed, set);
        assert_eq!(parsed.iter().map(|b| b.glyph).collect::<String>(), "Q\"");
    }

    #[test]
    fn test_write_json_file() {
        let path = std::env::temp_dir().join(format!("receipt_synth_{}.json", std::process::id()));
        let set: AnnotationSet = vec![sample()].into_iter().collect();
        set.write_json(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(AnnotationSet::from_json(&contents).unwrap(), set);
    }
}
