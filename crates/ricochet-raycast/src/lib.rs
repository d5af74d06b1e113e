//! Ricochet raycast - finds where a world-space ray meets a triangle mesh.
//!
//! [`intersect_mesh`] works on any buffers straight from the host. Meshes that
//! never move can be baked once into a [`BakedMesh`] and kept in a
//! [`StaticMeshCache`].

pub mod baked;
pub mod intersect;

pub use baked::{intersect_baked, BakedMesh, StaticMeshCache};
pub use intersect::{intersect_mesh, intersect_triangle, MeshHit, RaycastOptions, TriangleHit};
