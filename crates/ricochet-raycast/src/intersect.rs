use glam::{Mat4, Vec3};
use ricochet_core::transform::normal_matrix;
use ricochet_core::{MeshBuffers, Ray, Result};
use serde::{Deserialize, Serialize};

/// Slack on the barycentric bounds so rays through a shared edge hit one side.
const BARYCENTRIC_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastOptions {
    pub max_distance: f32,
    /// Blend vertex normals at the hit instead of using the flat face normal.
    pub interpolate_normals: bool,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            max_distance: f32::MAX,
            interpolate_normals: false,
        }
    }
}

/// Nearest intersection of a ray with a mesh, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub point: Vec3,
    /// Unit length.
    pub normal: Vec3,
    pub distance: f32,
    /// Index of the triangle hit, counting in threes through the index buffer.
    pub triangle: usize,
    /// Weights of the triangle's three vertices at `point`.
    pub barycentric: Vec3,
}

/// Ray/triangle solution before the nearest hit is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub point: Vec3,
    pub distance: f32,
    pub barycentric: Vec3,
}

/// Intersects `ray` with the plane of `(a, b, c)` and keeps the solution when
/// it falls inside the triangle.
///
/// Degenerate triangles, rays parallel to the plane and hits behind the
/// origin all report `None`.
pub fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<TriangleHit> {
    let u = b - a;
    let v = c - a;
    let normal = u.cross(v);
    if normal == Vec3::ZERO {
        return None;
    }

    let denom = normal.dot(ray.direction);
    if denom == 0.0 {
        return None;
    }
    let alpha = normal.dot(a - ray.origin) / denom;
    if alpha < 0.0 {
        return None;
    }
    let point = ray.origin + ray.direction * alpha;

    let uu = u.dot(u);
    let uv = u.dot(v);
    let vv = v.dot(v);
    let w = point - a;
    let wu = w.dot(u);
    let wv = w.dot(v);
    let d = uv * uv - uu * vv;
    // Slivers small enough to underflow are as degenerate as a zero normal.
    if d == 0.0 || !d.is_finite() {
        return None;
    }

    let s = (uv * wv - vv * wu) / d;
    if s < -BARYCENTRIC_EPSILON || s > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }
    let t = (uv * wu - uu * wv) / d;
    if t < -BARYCENTRIC_EPSILON || s + t > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }

    Some(TriangleHit {
        point,
        distance: alpha,
        barycentric: Vec3::new(1.0 - s - t, s, t),
    })
}

/// Cheap rejection in the ray's own frame: the ray runs along `+Z` through
/// the origin, so a triangle wholly on one side of `x = 0` or `y = 0` misses.
pub(crate) fn beside_ray(points: [Vec3; 3]) -> bool {
    let [p1, p2, p3] = points;
    (p1.x < 0.0 && p2.x < 0.0 && p3.x < 0.0)
        || (p1.x > 0.0 && p2.x > 0.0 && p3.x > 0.0)
        || (p1.y > 0.0 && p2.y > 0.0 && p3.y > 0.0)
        || (p1.y < 0.0 && p2.y < 0.0 && p3.y < 0.0)
}

/// Walks every triangle of world-space geometry and keeps the closest hit.
pub(crate) fn nearest_hit(
    ray: &Ray,
    world_positions: &[Vec3],
    indices: &[u32],
    max_distance: f32,
) -> Option<(usize, TriangleHit)> {
    let ray_frame = ray.local_frame();
    let mut best: Option<(usize, TriangleHit)> = None;
    let mut best_distance_sq = f32::MAX;

    for (triangle, tri) in indices.chunks_exact(3).enumerate() {
        let corners = [
            world_positions[tri[0] as usize],
            world_positions[tri[1] as usize],
            world_positions[tri[2] as usize],
        ];
        if beside_ray(corners.map(|p| ray_frame.transform_point3(p))) {
            continue;
        }

        let Some(hit) = intersect_triangle(ray, corners[0], corners[1], corners[2]) else {
            continue;
        };
        if hit.distance > max_distance {
            continue;
        }

        let distance_sq = ray.origin.distance_squared(hit.point);
        if distance_sq < best_distance_sq {
            best_distance_sq = distance_sq;
            best = Some((triangle, hit));
        }
    }

    best
}

/// Nearest hit of a world-space `ray` with `mesh` placed by `local_to_world`.
///
/// `Ok(None)` is the ordinary miss; an error means the buffers are malformed.
pub fn intersect_mesh(
    ray: &Ray,
    mesh: &MeshBuffers,
    local_to_world: &Mat4,
    options: &RaycastOptions,
) -> Result<Option<MeshHit>> {
    mesh.validate()?;

    let world_positions: Vec<Vec3> = mesh
        .positions
        .iter()
        .map(|&p| local_to_world.transform_point3(p))
        .collect();

    let Some((triangle, hit)) = nearest_hit(ray, &world_positions, &mesh.indices, options.max_distance)
    else {
        return Ok(None);
    };

    let [i1, i2, i3] = mesh.triangle(triangle);
    let normal = if options.interpolate_normals {
        let to_world = normal_matrix(local_to_world);
        blend_normals(
            [mesh.normals[i1], mesh.normals[i2], mesh.normals[i3]].map(|n| to_world * n),
            hit.barycentric,
        )
    } else {
        face_normal(
            [world_positions[i1], world_positions[i2], world_positions[i3]],
            local_to_world.determinant() < 0.0,
        )
    };

    log::trace!("Ray hit triangle {} at distance {}", triangle, hit.distance);

    Ok(Some(MeshHit {
        point: hit.point,
        normal,
        distance: hit.distance,
        triangle,
        barycentric: hit.barycentric,
    }))
}

/// Winding normal of a world-space triangle. Mirroring transforms reverse the
/// winding, so the normal is flipped back.
pub(crate) fn face_normal(corners: [Vec3; 3], mirrored: bool) -> Vec3 {
    let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]).normalize_or_zero();
    if mirrored {
        -normal
    } else {
        normal
    }
}

pub(crate) fn blend_normals(normals: [Vec3; 3], barycentric: Vec3) -> Vec3 {
    (normals[0] * barycentric.x + normals[1] * barycentric.y + normals[2] * barycentric.z)
        .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use proptest::prelude::*;
    use ricochet_core::primitives;

    fn down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 5.0, z), Vec3::NEG_Y)
    }

    #[test]
    fn perpendicular_ray_hits_quad_centre() {
        let quad = primitives::create_quad(1.0, 1.0);
        let hit = intersect_mesh(&down_at(0.0, 0.0), &quad, &Mat4::IDENTITY, &RaycastOptions::default())
            .unwrap()
            .unwrap();

        assert!(hit.point.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-5));
        assert!((hit.distance - 5.0).abs() < 1e-5);
        assert!((hit.barycentric.element_sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let quad = primitives::create_quad(1.0, 1.0);
        let ray = Ray::new(Vec3::new(0.1, 5.0, 0.1), Vec3::Y);
        assert!(intersect_mesh(&ray, &quad, &Mat4::IDENTITY, &RaycastOptions::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn max_distance_limits_hits() {
        let quad = primitives::create_quad(1.0, 1.0);
        let options = RaycastOptions {
            max_distance: 4.0,
            ..Default::default()
        };
        assert!(intersect_mesh(&down_at(0.1, 0.2), &quad, &Mat4::IDENTITY, &options)
            .unwrap()
            .is_none());
    }

    #[test]
    fn nearest_of_stacked_surfaces_wins() {
        let cube = primitives::create_cube(1.0);
        let hit = intersect_mesh(&down_at(0.1, -0.2), &cube, &Mat4::IDENTITY, &RaycastOptions::default())
            .unwrap()
            .unwrap();
        assert!((hit.point.y - 0.5).abs() < 1e-5);
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn degenerate_and_parallel_triangles_are_skipped() {
        assert!(intersect_triangle(&down_at(0.0, 0.0), Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());

        let sideways = Ray::new(Vec3::new(-1.0, 0.0, 0.1), Vec3::X);
        assert!(intersect_triangle(
            &sideways,
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(-0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, -0.5)
        )
        .is_none());
    }

    #[test]
    fn underflowing_slivers_are_skipped() {
        // The normal survives as a subnormal but the edge determinant underflows to zero.
        let sliver = intersect_triangle(
            &down_at(0.0, 0.0),
            Vec3::ZERO,
            Vec3::new(1e-20, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1e-20),
        );
        assert!(sliver.is_none());
    }

    #[test]
    fn mirrored_transform_keeps_normal_facing_out() {
        let quad = primitives::create_quad(1.0, 1.0);
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let hit = intersect_mesh(&down_at(0.2, 0.1), &quad, &mirror, &RaycastOptions::default())
            .unwrap()
            .unwrap();
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-5));

        let interpolated = RaycastOptions {
            interpolate_normals: true,
            ..Default::default()
        };
        let hit = intersect_mesh(&down_at(0.2, 0.1), &quad, &mirror, &interpolated)
            .unwrap()
            .unwrap();
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn interpolated_normal_blends_vertices() {
        let mesh = MeshBuffers::new(
            vec![Vec3::new(-1.0, 0.0, -1.0), Vec3::new(-1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, -1.0)],
            vec![Vec3::X, Vec3::Y, Vec3::Y],
            vec![0, 1, 2],
        );
        let options = RaycastOptions {
            interpolate_normals: true,
            ..Default::default()
        };
        let hit = intersect_mesh(&down_at(-0.5, -0.5), &mesh, &Mat4::IDENTITY, &options)
            .unwrap()
            .unwrap();
        let expected = (Vec3::X * hit.barycentric.x + Vec3::Y * (1.0 - hit.barycentric.x)).normalize();
        assert!(hit.normal.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn malformed_buffers_error() {
        let mut quad = primitives::create_quad(1.0, 1.0);
        quad.indices.push(7);
        assert!(intersect_mesh(&down_at(0.0, 0.0), &quad, &Mat4::IDENTITY, &RaycastOptions::default()).is_err());
    }

    proptest! {
        #[test]
        fn barycentrics_survive_rigid_motion(
            x in -0.45f32..0.45,
            z in -0.45f32..0.45,
            angle in 0.0f32..std::f32::consts::TAU,
            axis in (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0),
            offset in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
        ) {
            let axis = Vec3::new(axis.0, axis.1, axis.2);
            prop_assume!(axis.length() > 0.1);
            // Away from the shared diagonal, where either triangle may claim the hit.
            prop_assume!((x + z).abs() > 0.01);
            let quad = primitives::create_quad(1.0, 1.0);
            let ray = down_at(x, z);
            let base = intersect_mesh(&ray, &quad, &Mat4::IDENTITY, &RaycastOptions::default())
                .unwrap()
                .unwrap();

            let motion = Mat4::from_rotation_translation(
                Quat::from_axis_angle(axis.normalize(), angle),
                Vec3::new(offset.0, offset.1, offset.2),
            );
            let moved = intersect_mesh(&ray.transformed(&motion), &quad, &motion, &RaycastOptions::default())
                .unwrap()
                .unwrap();

            prop_assert_eq!(base.triangle, moved.triangle);
            prop_assert!(base.barycentric.abs_diff_eq(moved.barycentric, 1e-3));
            prop_assert!((base.distance - moved.distance).abs() < 1e-3);
        }
    }
}
