//! Triangle mesh with face-relative UV coordinates
//!
//! A vertex may carry a different UV on each face that touches it (UV seams),
//! so UVs live on the faces rather than on the vertices.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::{Mat4, Point2, Point3};

/// Mesh construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A face references a vertex that does not exist
    #[error("Face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        /// Offending face id
        face: usize,
        /// Offending vertex id
        vertex: usize,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// A vertex position or UV is NaN or infinite
    #[error("Face {face} has a non-finite UV or position")]
    NonFinite {
        /// Offending face id
        face: usize,
    },
}

/// One triangle: three vertex ids and the UV each corner has on this face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Vertex ids, in winding order
    pub vertices: [usize; 3],
    /// UV of each corner, matching `vertices`
    pub uvs: [Point2; 3],
}

impl Face {
    /// Create a face
    pub const fn new(vertices: [usize; 3], uvs: [Point2; 3]) -> Self {
        Self { vertices, uvs }
    }
}

/// Deformed surface snapshot as handed over by a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct UvMesh {
    positions: Vec<Point3>,
    faces: Vec<Face>,
    transform: Mat4,
}

impl UvMesh {
    /// Create a mesh, checking that every face references existing vertices
    pub fn new(positions: Vec<Point3>, faces: Vec<Face>) -> Result<Self, MeshError> {
        for (face_id, face) in faces.iter().enumerate() {
            if let Some(&vertex) = face.vertices.iter().find(|&&v| v >= positions.len()) {
                return Err(MeshError::VertexOutOfRange {
                    face: face_id,
                    vertex,
                    vertex_count: positions.len(),
                });
            }
            let finite_uvs = face.uvs.iter().all(|uv| uv.x.is_finite() && uv.y.is_finite());
            let finite_positions = face
                .vertices
                .iter()
                .all(|&v| positions[v].coords.iter().all(|c| c.is_finite()));
            if !finite_uvs || !finite_positions {
                return Err(MeshError::NonFinite { face: face_id });
            }
        }

        Ok(Self {
            positions,
            faces,
            transform: Mat4::identity(),
        })
    }

    /// Flat `width` x `height` sheet in the XY plane, centered on the origin
    ///
    /// Split into `cols` x `rows` cells of two triangles each. UVs span
    /// `[0, 1]²` with V increasing along +Y.
    pub fn sheet(cols: usize, rows: usize, width: f64, height: f64) -> Self {
        let (cols, rows) = (cols.max(1), rows.max(1));
        let mut positions = Vec::with_capacity((cols + 1) * (rows + 1));
        let mut uvs = Vec::with_capacity(positions.capacity());

        for j in 0..=rows {
            for i in 0..=cols {
                let u = i as f64 / cols as f64;
                let v = j as f64 / rows as f64;
                positions.push(Point3::new((u - 0.5) * width, (v - 0.5) * height, 0.0));
                uvs.push(Point2::new(u, v));
            }
        }

        let index = |i: usize, j: usize| j * (cols + 1) + i;
        let mut faces = Vec::with_capacity(cols * rows * 2);
        for j in 0..rows {
            for i in 0..cols {
                let (bl, br) = (index(i, j), index(i + 1, j));
                let (tr, tl) = (index(i + 1, j + 1), index(i, j + 1));
                faces.push(Face::new([bl, br, tr], [uvs[bl], uvs[br], uvs[tr]]));
                faces.push(Face::new([bl, tr, tl], [uvs[bl], uvs[tr], uvs[tl]]));
            }
        }

        Self {
            positions,
            faces,
            transform: Mat4::identity(),
        }
    }

    /// Set the local-to-world transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Displace every vertex; UVs are untouched
    pub fn deform<F: Fn(&Point3) -> Point3>(&mut self, displace: F) {
        for position in &mut self.positions {
            *position = displace(position);
        }
    }

    /// Local vertex positions
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// All faces
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// One face by id
    pub fn face(&self, id: usize) -> Option<&Face> {
        self.faces.get(id)
    }

    /// Local-to-world transform
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Local positions of a face's three corners
    pub fn face_positions(&self, face: &Face) -> [Point3; 3] {
        face.vertices.map(|v| self.positions[v])
    }

    /// Map a local point into world space
    pub fn to_world(&self, local: &Point3) -> Point3 {
        self.transform.transform_point(local)
    }

    /// Extent of the mesh's local positions as `(min, max)`
    pub fn local_bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        }))
    }
}
