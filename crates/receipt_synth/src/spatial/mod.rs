//! Spatial indexing over UV space
//!
//! Provides the nearest-sample quadtree and the face locator built on it,
//! used to find which mesh faces may contain a texture-space point.

mod face_locator;
mod quadtree;

pub use face_locator::{FaceLocator, VertexFaceIndex};
pub use quadtree::{QuadtreeConfig, QuadtreeNode, UvBounds, UvQuadtree, UvSample};
