//! Small in-memory world for headless runs and tests.

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use parking_lot::RwLock;
use ricochet_core::transform::normal_matrix;
use ricochet_core::{Aabb, LayerMask, MeshBuffers, Ray, Transform};
use ricochet_raycast::{intersect_mesh, RaycastOptions};
use ricochet_terrain::Terrain;

use crate::host::{HostHit, HostWorld, Surface, TargetId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TargetFlags: u32 {
        const STATIC = 1 << 0;
        const RIGID_BODY = 1 << 1;
    }
}

#[derive(Debug, Clone)]
pub enum Geometry {
    Mesh(Arc<MeshBuffers>),
    Terrain {
        terrain: Arc<Terrain>,
        /// Full-resolution grid used for collider queries.
        collision: Arc<MeshBuffers>,
    },
}

/// Shape the scene's ray casts test against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    /// The object's own triangles.
    Geometry,
    /// Local-space box, which may be looser than the visible mesh.
    Box(Aabb),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    pub force: Vec3,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub tag: String,
    pub layer: u8,
    pub flags: TargetFlags,
    pub transform: Transform,
    pub geometry: Geometry,
    pub collider: Collider,
    pub forces: Vec<AppliedForce>,
}

impl SceneObject {
    pub fn mesh(tag: impl Into<String>, mesh: MeshBuffers) -> Self {
        Self {
            tag: tag.into(),
            layer: 0,
            flags: TargetFlags::empty(),
            transform: Transform::default(),
            geometry: Geometry::Mesh(Arc::new(mesh)),
            collider: Collider::Geometry,
            forces: Vec::new(),
        }
    }

    /// Terrain objects take their placement from the terrain itself.
    pub fn terrain(tag: impl Into<String>, terrain: Terrain) -> Self {
        let collision = Arc::new(terrain.to_mesh());
        Self {
            tag: tag.into(),
            layer: 0,
            flags: TargetFlags::STATIC,
            transform: terrain.transform,
            geometry: Geometry::Terrain {
                terrain: Arc::new(terrain),
                collision,
            },
            collider: Collider::Geometry,
            forces: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_flags(mut self, flags: TargetFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_box_collider(mut self, bounds: Aabb) -> Self {
        self.collider = Collider::Box(bounds);
        self
    }

    fn local_to_world(&self) -> Mat4 {
        match &self.geometry {
            Geometry::Mesh(_) => self.transform.to_matrix(),
            Geometry::Terrain { terrain, .. } => terrain.local_to_world(),
        }
    }

    fn collider_hit(&self, target: TargetId, ray: &Ray, max_distance: f32) -> Option<HostHit> {
        let local_to_world = self.local_to_world();
        match self.collider {
            Collider::Geometry => {
                let mesh = match &self.geometry {
                    Geometry::Mesh(mesh) => mesh,
                    Geometry::Terrain { collision, .. } => collision,
                };
                let options = RaycastOptions {
                    max_distance,
                    interpolate_normals: false,
                };
                match intersect_mesh(ray, mesh, &local_to_world, &options) {
                    Ok(hit) => hit.map(|hit| HostHit {
                        target,
                        point: hit.point,
                        normal: hit.normal,
                        distance: hit.distance,
                    }),
                    Err(err) => {
                        log::warn!("Skipping collider of target {target}: {err}");
                        None
                    }
                }
            }
            Collider::Box(bounds) => box_hit(target, &bounds, &local_to_world, ray, max_distance),
        }
    }
}

fn box_hit(target: TargetId, bounds: &Aabb, local_to_world: &Mat4, ray: &Ray, max_distance: f32) -> Option<HostHit> {
    let local_ray = ray.transformed(&local_to_world.inverse());
    let entry = bounds.ray_entry(&local_ray, f32::MAX)?;
    let local_point = local_ray.at(entry);

    let point = local_to_world.transform_point3(local_point);
    let distance = point.distance(ray.origin);
    if distance > max_distance {
        return None;
    }

    let offset = (local_point - bounds.center()) / bounds.half_extents().max(Vec3::splat(f32::EPSILON));
    let magnitude = offset.abs();
    let axis = if magnitude.x >= magnitude.y && magnitude.x >= magnitude.z {
        0
    } else if magnitude.y >= magnitude.z {
        1
    } else {
        2
    };
    let mut local_normal = Vec3::ZERO;
    local_normal[axis] = offset[axis].signum();
    let normal = (normal_matrix(local_to_world) * local_normal).normalize_or_zero();

    Some(HostHit {
        target,
        point,
        normal,
        distance,
    })
}

/// Objects keyed by target id, shareable between threads like the host's own scene.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Arc<RwLock<HashMap<TargetId, SceneObject>>>,
    next_id: Arc<RwLock<TargetId>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, object: SceneObject) -> TargetId {
        let mut next_id = self.next_id.write();
        let id = *next_id;
        *next_id += 1;

        self.objects.write().insert(id, object);
        id
    }

    pub fn remove(&self, id: TargetId) -> Option<SceneObject> {
        self.objects.write().remove(&id)
    }

    pub fn get(&self, id: TargetId) -> Option<SceneObject> {
        self.objects.read().get(&id).cloned()
    }

    pub fn update<F, R>(&self, id: TargetId, f: F) -> Option<R>
    where
        F: FnOnce(&mut SceneObject) -> R,
    {
        self.objects.write().get_mut(&id).map(f)
    }

    pub fn forces_on(&self, id: TargetId) -> Vec<AppliedForce> {
        self.objects
            .read()
            .get(&id)
            .map(|o| o.forces.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl HostWorld for Scene {
    fn raycast(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<HostHit> {
        self.raycast_all(ray, max_distance, mask)
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn raycast_all(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Vec<HostHit> {
        self.objects
            .read()
            .iter()
            .filter(|(_, object)| mask.contains_layer(object.layer))
            .filter_map(|(&id, object)| object.collider_hit(id, ray, max_distance))
            .collect()
    }

    fn surface(&self, target: TargetId) -> Option<Surface> {
        let objects = self.objects.read();
        let object = objects.get(&target)?;
        Some(match &object.geometry {
            Geometry::Mesh(mesh) => Surface::Mesh {
                mesh: Arc::clone(mesh),
                local_to_world: object.transform.to_matrix(),
                is_static: object.flags.contains(TargetFlags::STATIC),
            },
            Geometry::Terrain { terrain, .. } => Surface::Terrain(Arc::clone(terrain)),
        })
    }

    fn tag(&self, target: TargetId) -> Option<String> {
        self.objects.read().get(&target).map(|o| o.tag.clone())
    }

    fn apply_force(&self, target: TargetId, force: Vec3, position: Vec3) -> bool {
        self.update(target, |object| {
            if !object.flags.contains(TargetFlags::RIGID_BODY) {
                return false;
            }
            object.forces.push(AppliedForce { force, position });
            true
        })
        .unwrap_or(false)
    }
}
