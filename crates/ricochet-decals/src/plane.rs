//! One face of the decal clip box.

use glam::Vec3;

/// Oriented half-space built from three points of a box face.
///
/// The normal is left unnormalized: only the sign of the distance is ever used,
/// and interpolation factors are ratios of distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    anchor: Vec3,
    normal: Vec3,
    inverted: bool,
}

impl ClipPlane {
    pub fn from_points(p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        Self {
            anchor: p1,
            normal: (p2 - p1).cross(p3 - p1),
            inverted: false,
        }
    }

    /// Flips which side counts as inside.
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// `dot(normal, anchor - point)`; negative on the non-inverted inside.
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(self.anchor - point)
    }

    /// Points lying exactly on the plane are outside.
    pub fn is_inside(&self, point: Vec3) -> bool {
        let distance = self.distance(point);
        if self.inverted {
            distance > 0.0
        } else {
            distance < 0.0
        }
    }

    /// Factor `alpha` such that segment `a -> b` crosses the plane at
    /// `a + alpha * (b - a)`. Only meaningful when exactly one endpoint is inside.
    pub fn interpolation_factor(&self, a: Vec3, b: Vec3) -> f32 {
        let da = self.distance(a);
        let db = self.distance(b);
        da / (da - db)
    }

    /// Crossing point of `a -> b` together with the normal blended by the same factor.
    pub fn intersect(&self, a: Vec3, b: Vec3, na: Vec3, nb: Vec3) -> (Vec3, Vec3) {
        let alpha = self.interpolation_factor(a, b);
        (a.lerp(b, alpha), na.lerp(nb, alpha))
    }
}
