//! Ricochet - decals projected onto meshes and terrain where shots land.
//!
//! The work is split across small crates that can be used on their own:
//! geometry clipping in [`decals`], ray/mesh queries in [`raycast`],
//! heightfield patches in [`terrain`], bounded instance reuse in [`pool`],
//! and the frame-driven controller tying them to a host in [`impact`].

pub use ricochet_core as core;
pub use ricochet_decals as decals;
pub use ricochet_impact as impact;
pub use ricochet_pool as pool;
pub use ricochet_raycast as raycast;
pub use ricochet_terrain as terrain;

pub mod prelude {
    pub use crate::core::{
        primitives, Camera, LayerMask, MeshBuffers, Ray, Result, RicochetError, Transform, Vertex, Viewport,
    };
    pub use crate::decals::{DecalMesh, DecalProjection, DecalProjector, ProjectorSettings};
    pub use crate::impact::{
        FrameContext, HostSystem, HostWorld, ImpactConfig, ImpactController, ImpactOutcome, ImpactSource,
        MarkBlueprint, MarkSettings, MarkStore, RaySource, Scene, SceneObject, TagBlueprints, TargetFlags,
    };
    pub use crate::pool::{InstanceFactory, InstancePool, PoolConfig};
    pub use crate::raycast::{intersect_mesh, MeshHit, RaycastOptions};
    pub use crate::terrain::{Heightmap, Terrain, TerrainSampler};
    pub use glam;
}
