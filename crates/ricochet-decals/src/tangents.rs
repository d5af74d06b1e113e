//! Per-vertex tangent frames for decal meshes.

use glam::{Vec2, Vec3, Vec4};

/// Solves tangents from UV and position deltas, accumulated per vertex.
///
/// Triangles whose UVs are degenerate contribute nothing. Each accumulated
/// tangent is orthogonalized against the vertex normal; `w` carries the
/// bitangent handedness as `±1`.
pub fn compute_tangents(
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    indices: &[u32],
) -> Vec<Vec4> {
    let count = positions.len();
    let mut tan1 = vec![Vec3::ZERO; count];
    let mut tan2 = vec![Vec3::ZERO; count];

    for tri in indices.chunks_exact(3) {
        let [i1, i2, i3] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i1 >= count || i2 >= count || i3 >= count {
            continue;
        }

        let e1 = positions[i2] - positions[i1];
        let e2 = positions[i3] - positions[i1];
        let d1 = uvs[i2] - uvs[i1];
        let d2 = uvs[i3] - uvs[i1];

        let det = d1.x * d2.y - d2.x * d1.y;
        if det == 0.0 {
            continue;
        }
        let r = 1.0 / det;

        let sdir = (e1 * d2.y - e2 * d1.y) * r;
        let tdir = (e2 * d1.x - e1 * d2.x) * r;

        for i in [i1, i2, i3] {
            tan1[i] += sdir;
            tan2[i] += tdir;
        }
    }

    (0..count)
        .map(|i| {
            let n = normals[i].normalize_or_zero();
            let t = tan1[i];

            let orthogonal = t - n * n.dot(t);
            let tangent = if orthogonal.length_squared() > f32::EPSILON {
                orthogonal.normalize()
            } else if n != Vec3::ZERO {
                n.any_orthonormal_vector()
            } else {
                Vec3::X
            };

            let w = if n.cross(tangent).dot(tan2[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            tangent.extend(w)
        })
        .collect()
}
