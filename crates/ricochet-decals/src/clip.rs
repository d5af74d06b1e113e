//! Sutherland–Hodgman clipping of triangle fragments against the clip volume.

use arrayvec::ArrayVec;
use glam::Vec3;

use crate::plane::ClipPlane;
use crate::volume::ClipVolume;

/// A triangle clipped by six planes gains at most one point per plane.
/// The extra headroom absorbs near-coplanar rounding.
pub const MAX_FRAGMENT_POINTS: usize = 12;

/// Clipped polygon with a normal per point, in decal-local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub points: ArrayVec<Vec3, MAX_FRAGMENT_POINTS>,
    pub normals: ArrayVec<Vec3, MAX_FRAGMENT_POINTS>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triangle(points: [Vec3; 3], normals: [Vec3; 3]) -> Self {
        let mut fragment = Self::new();
        for (point, normal) in points.into_iter().zip(normals) {
            fragment.points.push(point);
            fragment.normals.push(normal);
        }
        fragment
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns `false` when the fragment is full.
    fn push(&mut self, point: Vec3, normal: Vec3) -> bool {
        if self.points.is_full() {
            return false;
        }
        self.points.push(point);
        self.normals.push(normal);
        true
    }
}

/// Clips `fragment` against every plane of `volume` in turn.
///
/// `None` means nothing of the fragment survives (or too little to form a
/// polygon), which is an ordinary outcome for triangles near the box.
pub fn clip_to_volume(volume: &ClipVolume, fragment: Fragment) -> Option<Fragment> {
    let mut current = fragment;
    for plane in volume.planes() {
        current = clip_against_plane(plane, &current)?;
    }
    let current = weld_consecutive(current);
    (current.len() >= 3).then_some(current)
}

/// Squared distance under which two neighbouring points are merged.
const WELD_EPSILON: f32 = 1e-10;

/// Vertices lying exactly on a face come back twice, once kept and once as a
/// zero-length crossing. Collapse those runs so they don't turn into slivers.
fn weld_consecutive(fragment: Fragment) -> Fragment {
    let mut welded = Fragment::new();
    for (&point, &normal) in fragment.points.iter().zip(&fragment.normals) {
        let repeated = welded
            .points
            .last()
            .is_some_and(|last| last.distance_squared(point) <= WELD_EPSILON);
        if !repeated {
            welded.push(point, normal);
        }
    }
    while welded.len() > 1 {
        let (first, last) = (welded.points[0], welded.points[welded.len() - 1]);
        if first.distance_squared(last) > WELD_EPSILON {
            break;
        }
        welded.points.pop();
        welded.normals.pop();
    }
    welded
}

fn clip_against_plane(plane: &ClipPlane, input: &Fragment) -> Option<Fragment> {
    let count = input.len();
    if count == 0 {
        return None;
    }

    let mut output = Fragment::new();
    let mut start = count - 1;
    let mut start_inside = plane.is_inside(input.points[start]);

    for end in 0..count {
        let end_inside = plane.is_inside(input.points[end]);

        if end_inside != start_inside {
            let (point, normal) = plane.intersect(
                input.points[start],
                input.points[end],
                input.normals[start],
                input.normals[end],
            );
            if !output.push(point, normal) {
                log::warn!("Clipped fragment exceeded {MAX_FRAGMENT_POINTS} points, dropping it");
                return None;
            }
        }
        if end_inside && !output.push(input.points[end], input.normals[end]) {
            log::warn!("Clipped fragment exceeded {MAX_FRAGMENT_POINTS} points, dropping it");
            return None;
        }

        start = end;
        start_inside = end_inside;
    }

    (!output.is_empty()).then_some(output)
}
