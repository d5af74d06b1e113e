use crate::{Aabb, Result, RicochetError};
use glam::Vec3;

/// Read-only geometry handed over by the host: parallel position/normal arrays
/// plus a flat triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex indices of triangle `i`.
    ///
    /// Callers are expected to stay below [`MeshBuffers::triangle_count`].
    pub fn triangle(&self, i: usize) -> [usize; 3] {
        [
            self.indices[i * 3] as usize,
            self.indices[i * 3 + 1] as usize,
            self.indices[i * 3 + 2] as usize,
        ]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.positions)
    }

    /// Checks the buffer invariants every geometry routine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(RicochetError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if self.normals.len() != self.positions.len() {
            return Err(RicochetError::InvalidMesh(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            )));
        }
        let len = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= len) {
            return Err(RicochetError::IndexOutOfRange { index, len });
        }
        Ok(())
    }
}

pub mod primitives {
    use super::*;

    /// Flat XZ grid centred on the origin with `+Y` normals.
    ///
    /// Triangles wind so that `cross(p1 - p0, p2 - p0)` points up.
    pub fn create_plane(width: f32, depth: f32, subdivisions: u32) -> MeshBuffers {
        let subdivisions = subdivisions.max(1);
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();

        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                let u = x as f32 / subdivisions as f32;
                let v = z as f32 / subdivisions as f32;

                positions.push(Vec3::new((u - 0.5) * width, 0.0, (v - 0.5) * depth));
                normals.push(Vec3::Y);
            }
        }

        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let i0 = z * (subdivisions + 1) + x;
                let i1 = i0 + 1;
                let i2 = (z + 1) * (subdivisions + 1) + x;
                let i3 = i2 + 1;

                indices.extend_from_slice(&[i0, i2, i1]);
                indices.extend_from_slice(&[i1, i2, i3]);
            }
        }

        MeshBuffers::new(positions, normals, indices)
    }

    /// Two-triangle quad, the smallest useful target surface.
    pub fn create_quad(width: f32, depth: f32) -> MeshBuffers {
        create_plane(width, depth, 1)
    }

    /// Axis-aligned box with per-face normals, 24 vertices.
    pub fn create_cube(size: f32) -> MeshBuffers {
        let s = size * 0.5;
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, right, up) in faces {
            let base = positions.len() as u32;
            let centre = normal * s;
            positions.push(centre - right * s - up * s);
            positions.push(centre + right * s - up * s);
            positions.push(centre + right * s + up * s);
            positions.push(centre - right * s + up * s);
            normals.extend_from_slice(&[normal; 4]);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        MeshBuffers::new(positions, normals, indices)
    }
}
