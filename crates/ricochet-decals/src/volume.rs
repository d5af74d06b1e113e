//! The unit clip box every decal is projected through.

use glam::Vec3;

use crate::plane::ClipPlane;

/// Half extent of the clip box on every axis, in decal-local units.
pub const HALF_EXTENT: f32 = 0.5;

/// How a triangle relates to the clip box according to the cheap per-axis tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every vertex lies beyond the same face.
    Outside,
    /// Every vertex lies strictly inside the box.
    Inside,
    /// Needs real clipping.
    Straddling,
}

/// Six planes bounding `[-0.5, 0.5]^3` in decal-local space.
#[derive(Debug, Clone)]
pub struct ClipVolume {
    planes: [ClipPlane; 6],
}

impl ClipVolume {
    pub fn unit() -> Self {
        let h = HALF_EXTENT;
        let corners = [
            Vec3::new(h, -h, h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(h, -h, -h),
        ];

        let planes = [
            ClipPlane::from_points(corners[0], corners[1], corners[2]),
            ClipPlane::from_points(corners[0], corners[2], corners[4]),
            ClipPlane::from_points(corners[4], corners[5], corners[6]),
            ClipPlane::from_points(corners[5], corners[3], corners[1]),
            ClipPlane::from_points(corners[2], corners[3], corners[5]),
            // The bottom face winds the other way round.
            ClipPlane::from_points(corners[0], corners[1], corners[6]).with_inverted(true),
        ];

        Self { planes }
    }

    pub fn planes(&self) -> &[ClipPlane; 6] {
        &self.planes
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.is_inside(point))
    }

    pub fn classify(&self, triangle: &[Vec3; 3]) -> Coverage {
        let [a, b, c] = *triangle;
        let h = HALF_EXTENT;

        let outside = (0..3).any(|axis| {
            (a[axis] < -h && b[axis] < -h && c[axis] < -h)
                || (a[axis] > h && b[axis] > h && c[axis] > h)
        });
        if outside {
            return Coverage::Outside;
        }

        let strictly_inside = |p: Vec3| p.abs().cmplt(Vec3::splat(h)).all();
        if strictly_inside(a) && strictly_inside(b) && strictly_inside(c) {
            Coverage::Inside
        } else {
            Coverage::Straddling
        }
    }
}

impl Default for ClipVolume {
    fn default() -> Self {
        Self::unit()
    }
}
