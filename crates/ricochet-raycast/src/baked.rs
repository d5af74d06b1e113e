//! Pre-extracted geometry for meshes that never move.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use glam::{Mat4, Vec3};
use ricochet_core::transform::normal_matrix;
use ricochet_core::{Aabb, MeshBuffers, Ray, Result};

use crate::intersect::{blend_normals, face_normal, nearest_hit, MeshHit, RaycastOptions};

/// World-space copy of a static mesh, ready for repeated ray tests.
#[derive(Debug, Clone)]
pub struct BakedMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Aabb,
    mirrored: bool,
}

impl BakedMesh {
    pub fn bake(mesh: &MeshBuffers, local_to_world: &Mat4) -> Result<Self> {
        mesh.validate()?;

        let to_world = normal_matrix(local_to_world);
        let positions: Vec<Vec3> = mesh
            .positions
            .iter()
            .map(|&p| local_to_world.transform_point3(p))
            .collect();
        let normals = mesh.normals.iter().map(|&n| to_world * n).collect();
        let bounds = Aabb::from_points(&positions);

        Ok(Self {
            positions,
            normals,
            indices: mesh.indices.clone(),
            bounds,
            mirrored: local_to_world.determinant() < 0.0,
        })
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Same result as [`crate::intersect_mesh`] on the unbaked mesh, with a
/// bounding-box early out.
pub fn intersect_baked(ray: &Ray, baked: &BakedMesh, options: &RaycastOptions) -> Option<MeshHit> {
    baked.bounds.ray_entry(ray, options.max_distance)?;

    let (triangle, hit) = nearest_hit(ray, &baked.positions, &baked.indices, options.max_distance)?;
    let corners = [
        baked.indices[triangle * 3] as usize,
        baked.indices[triangle * 3 + 1] as usize,
        baked.indices[triangle * 3 + 2] as usize,
    ];

    let normal = if options.interpolate_normals {
        blend_normals(corners.map(|i| baked.normals[i]), hit.barycentric)
    } else {
        face_normal(corners.map(|i| baked.positions[i]), baked.mirrored)
    };

    Some(MeshHit {
        point: hit.point,
        normal,
        distance: hit.distance,
        triangle,
        barycentric: hit.barycentric,
    })
}

/// Baked meshes keyed by host target.
#[derive(Debug)]
pub struct StaticMeshCache<K> {
    meshes: HashMap<K, BakedMesh>,
}

impl<K: Eq + Hash> StaticMeshCache<K> {
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
        }
    }

    /// Returns the cached bake for `key`, baking `mesh` on first use.
    pub fn get_or_bake(&mut self, key: K, mesh: &MeshBuffers, local_to_world: &Mat4) -> Result<&BakedMesh> {
        match self.meshes.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let baked = BakedMesh::bake(mesh, local_to_world)?;
                log::debug!("Baked static mesh with {} triangles", baked.triangle_count());
                Ok(entry.insert(baked))
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&BakedMesh> {
        self.meshes.get(key)
    }

    /// Drops the bake for `key`; returns whether one existed.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.meshes.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl<K: Eq + Hash> Default for StaticMeshCache<K> {
    fn default() -> Self {
        Self::new()
    }
}
