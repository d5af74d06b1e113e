//! Projects an oriented decal box onto a triangle mesh.

use glam::{Mat4, Vec2, Vec3};
use ricochet_core::transform::normal_matrix;
use ricochet_core::{MeshBuffers, Result, RicochetError, Transform};
use serde::{Deserialize, Serialize};

use crate::clip::{clip_to_volume, Fragment};
use crate::mesh::DecalMesh;
use crate::tangents::compute_tangents;
use crate::triangulate::{EarClipTriangulator, Triangulator};
use crate::volume::{ClipVolume, Coverage};

/// Index order used for triangles that land wholly inside the box.
const PASS_THROUGH_ORDER: [u32; 3] = [1, 2, 0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorSettings {
    /// Drop triangles facing away from the decal's up axis.
    pub skip_opposite_faces: bool,
    /// Triangles whose averaged normal has `dot(n, up) <= backface_threshold` are culled.
    pub backface_threshold: f32,
    pub calculate_tangents: bool,
    pub texture_scale: f32,
    /// Lift along decal-local `+Y`, in local units.
    pub surface_offset: f32,
}

impl Default for ProjectorSettings {
    fn default() -> Self {
        Self {
            skip_opposite_faces: true,
            backface_threshold: 0.05,
            calculate_tangents: true,
            texture_scale: 1.0,
            surface_offset: 0.0,
        }
    }
}

pub struct DecalProjector<T = EarClipTriangulator> {
    settings: ProjectorSettings,
    volume: ClipVolume,
    triangulator: T,
}

impl DecalProjector {
    pub fn new(settings: ProjectorSettings) -> Self {
        Self::with_triangulator(settings, EarClipTriangulator)
    }
}

impl Default for DecalProjector {
    fn default() -> Self {
        Self::new(ProjectorSettings::default())
    }
}

impl<T: Triangulator> DecalProjector<T> {
    pub fn with_triangulator(settings: ProjectorSettings, triangulator: T) -> Self {
        Self {
            settings,
            volume: ClipVolume::unit(),
            triangulator,
        }
    }

    pub fn settings(&self) -> &ProjectorSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ProjectorSettings {
        &mut self.settings
    }

    /// Clips every triangle of `source` against the decal box.
    ///
    /// The result lives in the decal's local space. An empty mesh is a normal
    /// outcome; only broken input buffers or an unusable decal transform are errors.
    pub fn project(
        &self,
        decal: &Transform,
        target_local_to_world: &Mat4,
        source: &MeshBuffers,
    ) -> Result<DecalMesh> {
        source.validate()?;
        if decal.scale.cmpeq(Vec3::ZERO).any() || !decal.scale.is_finite() {
            return Err(RicochetError::InvalidConfiguration(format!(
                "decal scale {} cannot be inverted",
                decal.scale
            )));
        }
        if self.settings.texture_scale == 0.0 {
            return Err(RicochetError::InvalidConfiguration(
                "texture scale must be non-zero".to_string(),
            ));
        }

        let to_decal = decal.world_to_local() * *target_local_to_world;
        let normals_to_decal = normal_matrix(&to_decal);

        let mut mesh = DecalMesh::new();
        let (mut culled, mut rejected, mut clipped) = (0usize, 0usize, 0usize);

        for tri in source.triangles() {
            let points = tri.map(|i| to_decal.transform_point3(source.positions[i]));
            let normals = tri.map(|i| (normals_to_decal * source.normals[i]).normalize_or_zero());

            if self.settings.skip_opposite_faces && self.faces_away(&normals) {
                culled += 1;
                continue;
            }

            match self.volume.classify(&points) {
                Coverage::Outside => rejected += 1,
                Coverage::Inside => self.emit_triangle(&mut mesh, points, normals),
                Coverage::Straddling => {
                    clipped += 1;
                    let fragment = Fragment::from_triangle(points, normals);
                    match clip_to_volume(&self.volume, fragment) {
                        Some(fragment) => self.emit_fragment(&mut mesh, &fragment, decal.scale),
                        None => log::trace!("Triangle {tri:?} clipped away entirely"),
                    }
                }
            }
        }

        if self.settings.calculate_tangents && !mesh.is_empty() {
            mesh.tangents = Some(compute_tangents(
                &mesh.positions,
                &mesh.normals,
                &mesh.uvs,
                &mesh.indices,
            ));
        }

        log::debug!(
            "Projected decal over {} triangles: {} emitted, {} clipped, {} culled, {} rejected",
            source.triangle_count(),
            mesh.triangle_count(),
            clipped,
            culled,
            rejected
        );

        Ok(mesh)
    }

    fn faces_away(&self, normals: &[Vec3; 3]) -> bool {
        let average = (normals[0] + normals[1] + normals[2]) / 3.0;
        average.dot(Vec3::Y) <= self.settings.backface_threshold
    }

    fn uv(&self, point: Vec3) -> Vec2 {
        Vec2::new(point.x, point.z) / self.settings.texture_scale + Vec2::splat(0.5)
    }

    fn offset(&self, point: Vec3) -> Vec3 {
        point + Vec3::Y * self.settings.surface_offset
    }

    fn emit_triangle(&self, mesh: &mut DecalMesh, points: [Vec3; 3], normals: [Vec3; 3]) {
        let uvs = points.map(|p| self.uv(p));
        let positions = points.map(|p| self.offset(p));
        mesh.push_meshlet(&positions, &normals, &uvs, &PASS_THROUGH_ORDER);
    }

    fn emit_fragment(&self, mesh: &mut DecalMesh, fragment: &Fragment, scale: Vec3) {
        let footprint: Vec<Vec2> = fragment
            .points
            .iter()
            .map(|p| Vec2::new(p.x * scale.x, p.z * scale.z))
            .collect();
        let indices = self.triangulator.triangulate(&footprint);
        if indices.is_empty() {
            return;
        }

        let uvs: Vec<Vec2> = fragment.points.iter().map(|&p| self.uv(p)).collect();
        let positions: Vec<Vec3> = fragment.points.iter().map(|&p| self.offset(p)).collect();
        let normals: Vec<Vec3> = fragment
            .normals
            .iter()
            .map(|n| n.normalize_or_zero())
            .collect();
        mesh.push_meshlet(&positions, &normals, &uvs, &indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use ricochet_core::primitives;

    fn single_triangle(points: [Vec3; 3]) -> MeshBuffers {
        MeshBuffers::new(points.to_vec(), vec![Vec3::Y; 3], vec![0, 1, 2])
    }

    #[test]
    fn inside_triangle_passes_through_rotated() {
        let projector = DecalProjector::new(ProjectorSettings {
            surface_offset: 0.01,
            ..Default::default()
        });
        let tri = single_triangle([
            Vec3::new(-0.2, 0.0, -0.2),
            Vec3::new(-0.2, 0.0, 0.2),
            Vec3::new(0.2, 0.0, -0.2),
        ]);

        let mesh = projector
            .project(&Transform::default(), &Mat4::IDENTITY, &tri)
            .unwrap();
        assert_eq!(mesh.indices, vec![1, 2, 0]);
        assert!(mesh.positions[0].abs_diff_eq(Vec3::new(-0.2, 0.01, -0.2), 1e-6));
        // UVs come from the un-offset point.
        assert!(mesh.uvs[1].abs_diff_eq(Vec2::new(0.3, 0.7), 1e-6));
    }

    #[test]
    fn distant_triangle_yields_nothing() {
        let projector = DecalProjector::default();
        let tri = single_triangle([
            Vec3::new(3.0, 0.0, 3.0),
            Vec3::new(3.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 3.0),
        ]);
        let mesh = projector
            .project(&Transform::default(), &Mat4::IDENTITY, &tri)
            .unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.tangents.is_none());
    }

    #[test]
    fn opposite_faces_are_culled_unless_disabled() {
        let mut quad = primitives::create_quad(0.5, 0.5);
        for normal in &mut quad.normals {
            *normal = Vec3::NEG_Y;
        }

        let projector = DecalProjector::default();
        let culled = projector
            .project(&Transform::default(), &Mat4::IDENTITY, &quad)
            .unwrap();
        assert!(culled.is_empty());

        let projector = DecalProjector::new(ProjectorSettings {
            skip_opposite_faces: false,
            ..Default::default()
        });
        let kept = projector
            .project(&Transform::default(), &Mat4::IDENTITY, &quad)
            .unwrap();
        assert_eq!(kept.triangle_count(), 2);
    }

    #[test]
    fn grazing_faces_fall_under_threshold() {
        // Wall rotated 88 degrees away from the decal's up axis.
        let quad = primitives::create_quad(0.5, 0.5);
        let tilt = Mat4::from_rotation_x(88f32.to_radians());
        let projector = DecalProjector::default();
        assert!(projector
            .project(&Transform::default(), &tilt, &quad)
            .unwrap()
            .is_empty());

        let lenient = DecalProjector::new(ProjectorSettings {
            backface_threshold: -1.0,
            ..Default::default()
        });
        assert!(!lenient.project(&Transform::default(), &tilt, &quad).unwrap().is_empty());
    }

    #[test]
    fn output_stays_inside_box_and_uvs_in_unit_square() {
        let projector = DecalProjector::default();
        let plane = primitives::create_plane(4.0, 4.0, 7);
        let decal = Transform::new(
            Vec3::new(0.3, 0.0, -0.2),
            Quat::from_rotation_y(0.6),
            Vec3::new(1.5, 1.0, 0.8),
        );

        let mesh = projector.project(&decal, &Mat4::IDENTITY, &plane).unwrap();
        assert!(!mesh.is_empty());
        for (p, uv) in mesh.positions.iter().zip(&mesh.uvs) {
            assert!(p.abs().cmple(Vec3::splat(0.5 + 1e-4)).all());
            assert!(uv.cmpge(Vec2::splat(-1e-4)).all() && uv.cmple(Vec2::splat(1.0 + 1e-4)).all());
        }
    }

    #[test]
    fn clipped_fragments_keep_source_winding() {
        let projector = DecalProjector::default();
        let plane = primitives::create_plane(3.0, 3.0, 4);
        let decal = Transform::from_position_rotation(Vec3::new(0.1, 0.0, 0.2), Quat::from_rotation_y(0.4));

        let mesh = projector.project(&decal, &Mat4::IDENTITY, &plane).unwrap();
        for t in mesh.indices.chunks_exact(3) {
            let p = &mesh.positions;
            let (a, b, c) = (p[t[0] as usize], p[t[1] as usize], p[t[2] as usize]);
            assert!((b - a).cross(c - a).y >= 0.0);
        }
    }

    #[test]
    fn tangents_are_unit_and_orthogonal() {
        let projector = DecalProjector::default();
        let plane = primitives::create_plane(2.0, 2.0, 3);
        let tilt = Mat4::from_rotation_z(0.3);
        let decal = Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_z(0.3));

        let mesh = projector.project(&decal, &tilt, &plane).unwrap();
        let tangents = mesh.tangents.as_ref().unwrap();
        assert_eq!(tangents.len(), mesh.vertex_count());
        for (t, n) in tangents.iter().zip(&mesh.normals) {
            assert!((t.truncate().length() - 1.0).abs() < 1e-4);
            assert!(t.truncate().dot(*n).abs() < 1e-4);
            assert!(t.w == 1.0 || t.w == -1.0);
        }
    }

    #[test]
    fn invalid_buffers_are_rejected() {
        let projector = DecalProjector::default();
        let mut broken = primitives::create_quad(1.0, 1.0);
        broken.indices.truncate(4);
        assert!(projector
            .project(&Transform::default(), &Mat4::IDENTITY, &broken)
            .is_err());

        let flat = Transform::default().with_scale(Vec3::new(1.0, 0.0, 1.0));
        let quad = primitives::create_quad(1.0, 1.0);
        assert!(matches!(
            projector.project(&flat, &Mat4::IDENTITY, &quad),
            Err(RicochetError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: ProjectorSettings =
            serde_json::from_str(r#"{ "surface_offset": 0.02 }"#).unwrap();
        assert_eq!(settings.surface_offset, 0.02);
        assert!(settings.skip_opposite_faces);
        assert_eq!(settings.backface_threshold, 0.05);
    }
}
