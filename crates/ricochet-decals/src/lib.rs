//! Ricochet decals - clips an oriented box against triangle meshes and turns
//! the surviving fragments into a textured, tangent-framed decal mesh.

pub mod clip;
pub mod mesh;
pub mod plane;
pub mod projection;
pub mod projector;
pub mod tangents;
pub mod triangulate;
pub mod volume;

pub use clip::{clip_to_volume, Fragment, MAX_FRAGMENT_POINTS};
pub use mesh::DecalMesh;
pub use plane::ClipPlane;
pub use projection::DecalProjection;
pub use projector::{DecalProjector, ProjectorSettings};
pub use tangents::compute_tangents;
pub use triangulate::{EarClipTriangulator, Triangulator};
pub use volume::{ClipVolume, Coverage};
