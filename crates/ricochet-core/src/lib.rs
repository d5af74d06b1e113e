//! Ricochet core - math, mesh and camera types shared by every Ricochet crate.
//!
//! Nothing in here knows about decals, pools or impacts; the geometry crates
//! build on these types and the orchestration crate wires them to a host.

pub mod bounds;
pub mod camera;
pub mod error;
pub mod mesh;
pub mod ray;
pub mod transform;
pub mod vertex;
pub mod viewport;

pub use bounds::Aabb;
pub use camera::Camera;
pub use error::{Result, RicochetError};
pub use mesh::{primitives, MeshBuffers};
pub use ray::{LayerMask, Ray};
pub use transform::Transform;
pub use vertex::Vertex;
pub use viewport::Viewport;

pub use glam;
