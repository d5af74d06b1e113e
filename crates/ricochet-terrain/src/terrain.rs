use std::ops::Range;

use glam::{Mat4, Vec2, Vec3};
use ricochet_core::{MeshBuffers, Transform};
use serde::{Deserialize, Serialize};

use crate::heightmap::Heightmap;

/// Heightfield placed in the world. Samples span `[0, size.x] x [0, size.z]`
/// in terrain-local space, with normalized heights scaled by `size.y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub heightmap: Heightmap,
    pub size: Vec3,
    pub transform: Transform,
}

impl Terrain {
    pub fn new(heightmap: Heightmap, size: Vec3) -> Self {
        Self {
            heightmap,
            size,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn local_to_world(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Distance between neighbouring samples along X and Z.
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(
            self.size.x / (self.heightmap.width() - 1) as f32,
            self.size.z / (self.heightmap.height() - 1) as f32,
        )
    }

    /// Height in terrain-local units at normalized `(u, v)`.
    pub fn interpolated_height(&self, u: f32, v: f32) -> f32 {
        self.heightmap.sample_bilinear(u, v) * self.size.y
    }

    /// Unit normal at normalized `(u, v)`, blended from the four surrounding samples.
    pub fn interpolated_normal(&self, u: f32, v: f32) -> Vec3 {
        let w = self.heightmap.width();
        let h = self.heightmap.height();
        let x = u.clamp(0.0, 1.0) * (w - 1) as f32;
        let y = v.clamp(0.0, 1.0) * (h - 1) as f32;

        let x0 = (x.floor() as u32).min(w - 1);
        let y0 = (y.floor() as u32).min(h - 1);
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let n0 = self.sample_normal(x0, y0).lerp(self.sample_normal(x1, y0), fx);
        let n1 = self.sample_normal(x0, y1).lerp(self.sample_normal(x1, y1), fx);
        n0.lerp(n1, fy).normalize_or_zero()
    }

    /// Normal at a grid sample from central differences in local units.
    pub fn sample_normal(&self, x: u32, y: u32) -> Vec3 {
        let w = self.heightmap.width();
        let h = self.heightmap.height();
        let cell = self.cell_size();

        let (xl, xr) = (x.saturating_sub(1), (x + 1).min(w - 1));
        let (yd, yu) = (y.saturating_sub(1), (y + 1).min(h - 1));

        let slope_x = (self.heightmap.get_height(xr, y) - self.heightmap.get_height(xl, y)) * self.size.y
            / ((xr - xl) as f32 * cell.x);
        let slope_z = (self.heightmap.get_height(x, yu) - self.heightmap.get_height(x, yd)) * self.size.y
            / ((yu - yd) as f32 * cell.y);

        Vec3::new(-slope_x, 1.0, -slope_z).normalize_or_zero()
    }

    /// Local-space position of grid sample `(x, y)`.
    pub fn sample_position(&self, x: u32, y: u32) -> Vec3 {
        let cell = self.cell_size();
        Vec3::new(
            x as f32 * cell.x,
            self.heightmap.get_height(x, y) * self.size.y,
            y as f32 * cell.y,
        )
    }

    /// The whole heightfield as a triangle mesh in terrain-local space.
    pub fn to_mesh(&self) -> MeshBuffers {
        self.grid_patch(0..self.heightmap.width(), 0..self.heightmap.height())
    }

    /// Mesh over a window of samples. Triangles face `+Y`.
    pub(crate) fn grid_patch(&self, xs: Range<u32>, zs: Range<u32>) -> MeshBuffers {
        let columns = xs.len() as u32;
        let rows = zs.len() as u32;
        if columns < 2 || rows < 2 {
            return MeshBuffers::default();
        }

        let mut positions = Vec::with_capacity((columns * rows) as usize);
        let mut normals = Vec::with_capacity((columns * rows) as usize);
        for x in xs {
            for z in zs.clone() {
                positions.push(self.sample_position(x, z));
                normals.push(self.sample_normal(x, z));
            }
        }

        let mut indices = Vec::with_capacity(((columns - 1) * (rows - 1) * 6) as usize);
        for column in 0..columns - 1 {
            for row in 0..rows - 1 {
                let a = row + column * rows;
                let c = a + rows;
                let b = c + 1;
                let d = a + 1;
                indices.extend_from_slice(&[a, b, c, a, d, b]);
            }
        }

        MeshBuffers::new(positions, normals, indices)
    }
}
