//! Candidate faces for a UV point
//!
//! Every face corner contributes a `(vertex, uv)` sample. A query finds the
//! nearest sample and returns the faces around that sample's vertex. This is
//! a heuristic: across a UV seam or on a badly stretched face the containing
//! face may not be among the candidates.

use std::collections::HashSet;

use super::quadtree::{QuadtreeConfig, UvQuadtree};
use crate::foundation::math::Point2;
use crate::geometry::UvMesh;

/// Vertex to incident face adjacency
///
/// Faces are listed in mesh order and each face appears once per vertex it
/// references.
#[derive(Debug, Clone, Default)]
pub struct VertexFaceIndex {
    incident: Vec<Vec<usize>>,
}

impl VertexFaceIndex {
    /// Collect the incident faces of every vertex of `mesh`
    pub fn build(mesh: &UvMesh) -> Self {
        let mut incident = vec![Vec::new(); mesh.vertex_count()];
        for (face_id, face) in mesh.faces().iter().enumerate() {
            for &vertex in &face.vertices {
                let faces: &mut Vec<usize> = &mut incident[vertex];
                // A face's corners are visited together, so a repeat can only be the last entry
                if faces.last() != Some(&face_id) {
                    faces.push(face_id);
                }
            }
        }
        Self { incident }
    }

    /// Faces that reference `vertex`; empty for an unknown or isolated vertex
    pub fn faces_of(&self, vertex: usize) -> &[usize] {
        self.incident.get(vertex).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of vertices covered
    pub fn vertex_count(&self) -> usize {
        self.incident.len()
    }
}

/// Nearest-vertex face lookup over a mesh's UV layout
#[derive(Debug, Clone)]
pub struct FaceLocator {
    tree: UvQuadtree,
    adjacency: VertexFaceIndex,
}

impl FaceLocator {
    /// Index every face corner of `mesh`
    ///
    /// Corners sharing both vertex and UV are stored once; the first
    /// occurrence keeps its place in the tie-breaking order.
    pub fn build(mesh: &UvMesh, config: &QuadtreeConfig) -> Self {
        let mut seen = HashSet::new();
        let mut samples = Vec::with_capacity(mesh.face_count() * 3);

        for face in mesh.faces() {
            for (&vertex, uv) in face.vertices.iter().zip(&face.uvs) {
                if seen.insert((vertex, uv.x.to_bits(), uv.y.to_bits())) {
                    samples.push((vertex, *uv));
                }
            }
        }

        let tree = UvQuadtree::build(&samples, config.clone());
        let adjacency = VertexFaceIndex::build(mesh);

        log::debug!(
            "Face locator: {} UV samples over {} vertices, {} faces",
            samples.len(),
            mesh.vertex_count(),
            mesh.face_count()
        );

        Self { tree, adjacency }
    }

    /// Vertex whose UV sample is nearest to `uv`
    pub fn nearest_vertex(&self, uv: &Point2) -> Option<usize> {
        self.tree.nearest(uv).map(|sample| sample.vertex)
    }

    /// Faces around the vertex nearest to `uv`
    pub fn nearest_face_candidates(&self, uv: &Point2) -> &[usize] {
        self.nearest_vertex(uv)
            .map(|vertex| self.adjacency.faces_of(vertex))
            .unwrap_or_default()
    }

    /// Number of distinct UV samples
    pub fn sample_count(&self) -> usize {
        self.tree.len()
    }

    /// Vertex to face adjacency
    pub fn adjacency(&self) -> &VertexFaceIndex {
        &self.adjacency
    }
}
