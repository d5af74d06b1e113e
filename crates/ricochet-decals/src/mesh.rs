use glam::{Vec2, Vec3, Vec4};
use ricochet_core::Vertex;

/// Geometry produced by one projection, in decal-local space.
///
/// Meshlets from every clipped triangle are concatenated without welding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecalMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub tangents: Option<Vec<Vec4>>,
}

impl DecalMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mesh means the decal touched nothing.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        self.indices.clear();
        self.tangents = None;
    }

    /// Appends a meshlet; `indices` refer to the meshlet's own vertices.
    pub fn push_meshlet(&mut self, positions: &[Vec3], normals: &[Vec3], uvs: &[Vec2], indices: &[u32]) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(positions);
        self.normals.extend_from_slice(normals);
        self.uvs.extend_from_slice(uvs);
        self.indices.extend(indices.iter().map(|&i| base + i));
    }

    /// Interleaves the buffers for upload. Missing tangents become `(1, 0, 0, 1)`.
    pub fn to_vertices(&self) -> Vec<Vertex> {
        (0..self.positions.len())
            .map(|i| {
                let tangent = self
                    .tangents
                    .as_ref()
                    .and_then(|t| t.get(i).copied())
                    .unwrap_or(Vec4::new(1.0, 0.0, 0.0, 1.0));
                Vertex::new(self.positions[i], self.normals[i], tangent, self.uvs[i])
            })
            .collect()
    }
}
