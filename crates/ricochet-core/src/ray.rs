use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space ray. `direction` is kept normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// World-to-ray matrix: the origin maps to zero and the direction to `+Z`.
    pub fn local_frame(&self) -> Mat4 {
        let rotation = Quat::from_rotation_arc(Vec3::Z, self.direction);
        Mat4::from_rotation_translation(rotation, self.origin).inverse()
    }
}

/// 32 host collision layers, one bit each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn from_layers(layers: &[u8]) -> Self {
        Self(layers.iter().fold(0, |mask, &layer| mask | Self::bit(layer)))
    }

    pub fn contains_layer(&self, layer: u8) -> bool {
        self.0 & Self::bit(layer) != 0
    }

    fn bit(layer: u8) -> u32 {
        1u32.checked_shl(u32::from(layer)).unwrap_or(0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}
