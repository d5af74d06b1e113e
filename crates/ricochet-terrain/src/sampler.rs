use glam::Vec3;
use ricochet_core::{MeshBuffers, Transform};

use crate::terrain::Terrain;

/// Cuts the part of a terrain under a decal into a small mesh the projector
/// can clip.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerrainSampler;

impl TerrainSampler {
    /// Widest horizontal extent of a decal box.
    pub fn footprint(decal: &Transform) -> f32 {
        decal.scale.x.abs().max(decal.scale.z.abs())
    }

    /// Patch of samples centred on `world_position`, in terrain-local space.
    ///
    /// The window reaches `ceil(footprint / size * 0.5 * resolution)` samples to
    /// either side, plus two trailing samples, clamped to the heightmap. Feed
    /// the result to the projector with [`Terrain::local_to_world`].
    pub fn extract_patch(terrain: &Terrain, world_position: Vec3, footprint: f32) -> MeshBuffers {
        let local = terrain.transform.inverse_transform_point(world_position);
        let width = terrain.heightmap.width();
        let depth = terrain.heightmap.height();

        let xs = window(local.x / terrain.size.x, footprint / terrain.size.x, width);
        let zs = window(local.z / terrain.size.z, footprint / terrain.size.z, depth);

        let patch = terrain.grid_patch(xs.clone(), zs.clone());
        log::trace!(
            "Terrain patch x {:?} z {:?}: {} triangles",
            xs,
            zs,
            patch.triangle_count()
        );
        patch
    }
}

fn window(position_ratio: f32, size_ratio: f32, resolution: u32) -> std::ops::Range<u32> {
    let reach = (size_ratio * 0.5 * resolution as f32).ceil() as i64;
    let centre = (position_ratio * (resolution - 1) as f32) as i64;
    let limit = i64::from(resolution);

    let from = (centre - reach).clamp(0, limit);
    let to = (centre + reach + 2).clamp(0, limit);
    from as u32..to as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Heightmap;

    fn flat(resolution: u32, size: f32) -> Terrain {
        Terrain::new(Heightmap::new(resolution, resolution), Vec3::new(size, 10.0, size))
    }

    #[test]
    fn patch_covers_the_footprint() {
        let terrain = flat(65, 64.0);
        let impact = Vec3::new(20.3, 0.0, 31.7);
        let patch = TerrainSampler::extract_patch(&terrain, impact, 2.0);

        patch.validate().unwrap();
        let bounds = patch.bounds();
        assert!(bounds.min.x <= impact.x - 1.0 && bounds.max.x >= impact.x + 1.0);
        assert!(bounds.min.z <= impact.z - 1.0 && bounds.max.z >= impact.z + 1.0);
        assert!(patch.positions.len() < 100);
    }

    #[test]
    fn patch_is_clamped_at_terrain_edges() {
        let terrain = flat(17, 16.0);
        let patch = TerrainSampler::extract_patch(&terrain, Vec3::new(0.2, 0.0, 15.9), 4.0);
        patch.validate().unwrap();
        assert!(!patch.is_empty());
        let bounds = patch.bounds();
        assert!(bounds.min.x >= 0.0 && bounds.max.z <= 16.0);
    }

    #[test]
    fn patch_follows_terrain_transform() {
        let terrain = flat(33, 32.0).with_transform(Transform::from_position(Vec3::new(-16.0, 0.0, -16.0)));
        let patch = TerrainSampler::extract_patch(&terrain, Vec3::ZERO, 1.0);
        let centre = patch.bounds().center();
        assert!((centre.x - 16.0).abs() <= 2.0 && (centre.z - 16.0).abs() <= 2.0);
    }

    #[test]
    fn impact_far_outside_yields_nothing() {
        let terrain = flat(17, 16.0);
        let patch = TerrainSampler::extract_patch(&terrain, Vec3::new(500.0, 0.0, 500.0), 1.0);
        assert!(patch.is_empty());
    }

    #[test]
    fn footprint_uses_widest_side() {
        let decal = Transform::default().with_scale(Vec3::new(0.5, 3.0, 1.5));
        assert_eq!(TerrainSampler::footprint(&decal), 1.5);
    }
}
