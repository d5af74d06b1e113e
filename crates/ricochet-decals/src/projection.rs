use glam::{Quat, Vec3};
use ricochet_core::Transform;
use serde::{Deserialize, Serialize};

/// Oriented box a decal is projected through. Local `+Y` points away from the
/// surface; `size` scales the unit clip box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecalProjection {
    pub position: Vec3,
    pub rotation: Quat,
    pub size: Vec3,
}

impl DecalProjection {
    /// Box centred on a surface hit with local up along `normal`.
    pub fn from_hit(point: Vec3, normal: Vec3, size: Vec3) -> Self {
        let up = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            position: point,
            rotation: Quat::from_rotation_arc(Vec3::Y, up),
            size,
        }
    }

    /// Rotates the box about its own up axis by `angle` radians.
    pub fn with_spin(mut self, angle: f32) -> Self {
        self.rotation = (self.rotation * Quat::from_rotation_y(angle)).normalize();
        self
    }

    pub fn with_size(mut self, size: Vec3) -> Self {
        self.size = size;
        self
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation, self.size)
    }
}
