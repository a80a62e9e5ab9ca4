//! Surface geometry: the deformed mesh, the camera and barycentric math

pub mod barycentric;
pub mod camera;
pub mod mesh;

pub use camera::{Camera, CameraProjection, Projection};
pub use mesh::{Face, MeshError, UvMesh};
