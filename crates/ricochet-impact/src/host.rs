//! What the impact controller needs from the host engine.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use ricochet_core::{Camera, LayerMask, MeshBuffers, Ray};
use ricochet_terrain::Terrain;

pub type TargetId = u64;

/// Geometry behind a ray-cast target.
#[derive(Debug, Clone)]
pub enum Surface {
    Mesh {
        mesh: Arc<MeshBuffers>,
        local_to_world: Mat4,
        /// Static meshes never move, so their baked form can be cached.
        is_static: bool,
    },
    Terrain(Arc<Terrain>),
}

/// Collider hit reported by the host's physics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostHit {
    pub target: TargetId,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

pub trait HostWorld {
    /// Closest collider hit along `ray`.
    fn raycast(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<HostHit>;

    /// Every collider hit along `ray`, in no particular order.
    fn raycast_all(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Vec<HostHit>;

    fn surface(&self, target: TargetId) -> Option<Surface>;

    fn tag(&self, target: TargetId) -> Option<String>;

    /// Pushes a rigid body at `position`. Returns `false` when the target has none.
    fn apply_force(&self, target: TargetId, force: Vec3, position: Vec3) -> bool;
}

/// Turns a 2D detection coordinate into a world-space ray.
pub trait RaySource {
    fn screen_point_to_ray(&self, coordinate: Vec2) -> Ray;
}

impl RaySource for Camera {
    fn screen_point_to_ray(&self, coordinate: Vec2) -> Ray {
        Camera::screen_point_to_ray(self, coordinate)
    }
}

impl<T: RaySource + ?Sized> RaySource for Arc<T> {
    fn screen_point_to_ray(&self, coordinate: Vec2) -> Ray {
        (**self).screen_point_to_ray(coordinate)
    }
}
