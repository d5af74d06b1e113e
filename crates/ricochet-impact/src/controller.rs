//! Frame-driven orchestration: detection, ray casts, pooled marks and projection.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ricochet_core::{MeshBuffers, Ray, Result, RicochetError, Transform};
use ricochet_decals::{DecalMesh, DecalProjection, DecalProjector};
use ricochet_pool::InstancePool;
use ricochet_raycast::{intersect_baked, intersect_mesh, RaycastOptions, StaticMeshCache};
use ricochet_terrain::{Terrain, TerrainSampler};

use crate::host::{HostHit, HostWorld, RaySource, Surface, TargetId};
use crate::marks::{InstanceId, MarkStore};
use crate::settings::{ImpactConfig, UNTAGGED};
use crate::source::ImpactSource;

/// Per-frame data handed to host systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub frame_index: u64,
    pub delta_time: f32,
}

/// Lifecycle the host drives explicitly: once at start-up, then every frame.
pub trait HostSystem {
    fn configure(&mut self) -> Result<()>;

    fn on_frame_tick(&mut self, frame: &FrameContext) -> Vec<ImpactOutcome>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImpactOutcome {
    /// A mark with geometry now sits on `target`.
    Decal {
        target: TargetId,
        mark: InstanceId,
        effect: Option<InstanceId>,
        point: Vec3,
        normal: Vec3,
        triangles: usize,
    },
    /// The mark was placed but its box touched no facing geometry.
    Empty {
        target: TargetId,
        mark: InstanceId,
        effect: Option<InstanceId>,
    },
    Missed,
    /// Nothing is configured for the target's tag.
    NoBlueprint { target: TargetId, tag: String },
}

#[derive(Debug, Clone, Copy)]
struct PreparedMark {
    mark: InstanceId,
    effect: Option<InstanceId>,
}

pub struct ImpactController<S, W, R> {
    config: ImpactConfig,
    source: S,
    world: W,
    rays: R,
    projector: DecalProjector,
    pool: InstancePool<String, InstanceId>,
    marks: MarkStore,
    static_meshes: StaticMeshCache<TargetId>,
    rng: StdRng,
    reload_timer: f32,
    configured: bool,
}

impl<S, W, R> ImpactController<S, W, R>
where
    S: ImpactSource,
    W: HostWorld,
    R: RaySource,
{
    pub fn new(config: ImpactConfig, source: S, world: W, rays: R, marks: MarkStore) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            projector: DecalProjector::new(config.projector),
            pool: InstancePool::from_config(&config.pool),
            config,
            source,
            world,
            rays,
            marks,
            static_meshes: StaticMeshCache::new(),
            rng,
            reload_timer: 0.0,
            configured: false,
        }
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    pub fn marks(&self) -> &MarkStore {
        &self.marks
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn pool(&self) -> &InstancePool<String, InstanceId> {
        &self.pool
    }

    pub fn static_meshes(&self) -> &StaticMeshCache<TargetId> {
        &self.static_meshes
    }

    pub fn reload_timer(&self) -> f32 {
        self.reload_timer
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Consumes the pending detection and shoots through its coordinate.
    pub fn fire(&mut self) -> Result<ImpactOutcome> {
        self.source.reset();
        let coordinate = self.source.coordinate();
        let ray = self.rays.screen_point_to_ray(coordinate);
        log::debug!("Shot at {coordinate} along {}", ray.direction);
        self.fire_ray(&ray)
    }

    /// Shoots along an explicit world-space ray.
    pub fn fire_ray(&mut self, ray: &Ray) -> Result<ImpactOutcome> {
        match self
            .world
            .raycast(ray, self.config.max_distance, self.config.layer_mask)
        {
            Some(hit) => self.process_hit(ray, &hit, self.config.second_hit_depth),
            None => Ok(ImpactOutcome::Missed),
        }
    }

    fn process_hit(&mut self, ray: &Ray, hit: &HostHit, depth: u32) -> Result<ImpactOutcome> {
        let Some(surface) = self.world.surface(hit.target) else {
            log::warn!("Target {} has no surface to mark", hit.target);
            return Ok(ImpactOutcome::Missed);
        };

        match surface {
            Surface::Terrain(terrain) => self.mark_terrain(hit, &terrain),
            Surface::Mesh {
                mesh,
                local_to_world,
                is_static,
            } => {
                if self.config.force > 0.0 {
                    self.world
                        .apply_force(hit.target, ray.direction * self.config.force, hit.point);
                }

                let options = RaycastOptions {
                    max_distance: self.config.max_distance,
                    interpolate_normals: self.config.interpolate_normals,
                };
                let refined = if is_static && self.config.cache_static_meshes {
                    let baked = self
                        .static_meshes
                        .get_or_bake(hit.target, &mesh, &local_to_world)?;
                    intersect_baked(ray, baked, &options)
                } else {
                    intersect_mesh(ray, &mesh, &local_to_world, &options)?
                };

                match refined {
                    Some(found) => {
                        self.mark_mesh(hit.target, &mesh, &local_to_world, found.point, found.normal)
                    }
                    None if depth > 0 => self.next_hit(ray, depth - 1),
                    None => Ok(ImpactOutcome::Missed),
                }
            }
        }
    }

    /// The collider was hit but the mesh inside it was not: try whatever the
    /// ray meets second.
    fn next_hit(&mut self, ray: &Ray, depth: u32) -> Result<ImpactOutcome> {
        let mut hits = self
            .world
            .raycast_all(ray, self.config.max_distance, self.config.layer_mask);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        match hits.get(1) {
            Some(next) => {
                log::debug!("Mesh refinement missed, retrying on target {}", next.target);
                let next = *next;
                self.process_hit(ray, &next, depth)
            }
            None => Ok(ImpactOutcome::Missed),
        }
    }

    fn mark_mesh(
        &mut self,
        target: TargetId,
        mesh: &MeshBuffers,
        local_to_world: &Mat4,
        point: Vec3,
        normal: Vec3,
    ) -> Result<ImpactOutcome> {
        let tag = self.target_tag(target);
        let Some(prepared) = self.prepare_mark(&tag, point, normal) else {
            log::warn!("No mark blueprint for tag '{tag}'");
            return Ok(ImpactOutcome::NoBlueprint { target, tag });
        };

        let decal = self.mark_transform(prepared.mark)?;
        let projected = self.projector.project(&decal, local_to_world, mesh)?;
        Ok(self.commit(target, prepared, projected, point, normal))
    }

    fn mark_terrain(&mut self, hit: &HostHit, terrain: &Terrain) -> Result<ImpactOutcome> {
        let tag = self.target_tag(hit.target);
        let Some(prepared) = self.prepare_mark(&tag, hit.point, hit.normal) else {
            log::warn!("No mark blueprint for tag '{tag}'");
            return Ok(ImpactOutcome::NoBlueprint {
                target: hit.target,
                tag,
            });
        };

        let decal = self.mark_transform(prepared.mark)?;
        let patch = TerrainSampler::extract_patch(terrain, hit.point, TerrainSampler::footprint(&decal));
        let projected = self
            .projector
            .project(&decal, &terrain.local_to_world(), &patch)?;
        Ok(self.commit(hit.target, prepared, projected, hit.point, hit.normal))
    }

    fn target_tag(&self, target: TargetId) -> String {
        self.world
            .tag(target)
            .filter(|tag| !tag.is_empty())
            .unwrap_or_else(|| UNTAGGED.to_string())
    }

    /// Takes a mark (and its effect, if any) from the pool and poses it on the surface.
    fn prepare_mark(&mut self, tag: &str, point: Vec3, normal: Vec3) -> Option<PreparedMark> {
        let blueprint = self.config.marks.mark_for(tag, &mut self.rng)?.to_owned();
        let mut projection = DecalProjection::from_hit(point, normal, Vec3::ONE);
        if self.config.random_rotation {
            projection = projection.with_spin(self.rng.gen_range(0.0..TAU));
        }
        let mark = self
            .pool
            .take(&mut self.marks, &blueprint, projection.position, projection.rotation);

        // Pooled instances come back at their blueprint scale.
        if let Some(instance) = self.marks.get_mut(mark) {
            instance.transform = projection
                .with_size(instance.transform.scale * self.config.mark_scale)
                .transform();
        }

        let effect = match self.config.marks.effect_for(tag, &mut self.rng) {
            Some(effect) => {
                let effect = effect.to_owned();
                Some(self.pool.take(&mut self.marks, &effect, point, projection.rotation))
            }
            None => None,
        };

        Some(PreparedMark { mark, effect })
    }

    fn mark_transform(&self, mark: InstanceId) -> Result<Transform> {
        self.marks
            .get(mark)
            .map(|instance| instance.transform)
            .ok_or_else(|| RicochetError::MissingCollaborator(format!("mark instance {mark:?}")))
    }

    fn commit(
        &mut self,
        target: TargetId,
        prepared: PreparedMark,
        projected: DecalMesh,
        point: Vec3,
        normal: Vec3,
    ) -> ImpactOutcome {
        let triangles = projected.triangle_count();
        let empty = projected.is_empty();
        self.marks.attach(prepared.mark, target, projected);

        if empty {
            log::debug!("Mark {:?} on target {target} touched nothing", prepared.mark);
            ImpactOutcome::Empty {
                target,
                mark: prepared.mark,
                effect: prepared.effect,
            }
        } else {
            log::debug!("Mark {:?} on target {target}: {triangles} triangles", prepared.mark);
            ImpactOutcome::Decal {
                target,
                mark: prepared.mark,
                effect: prepared.effect,
                point,
                normal,
                triangles,
            }
        }
    }
}

impl<S, W, R> HostSystem for ImpactController<S, W, R>
where
    S: ImpactSource,
    W: HostWorld,
    R: RaySource,
{
    fn configure(&mut self) -> Result<()> {
        self.config.validate()?;
        if let Some(missing) = self
            .config
            .marks
            .blueprints()
            .find(|blueprint| !self.marks.has_blueprint(blueprint))
        {
            return Err(RicochetError::InvalidConfiguration(format!(
                "blueprint '{missing}' is used by mark settings but not registered"
            )));
        }

        self.projector = DecalProjector::new(self.config.projector);
        self.pool = InstancePool::from_config(&self.config.pool);
        self.static_meshes.clear();
        self.reload_timer = 0.0;
        self.configured = true;

        log::info!(
            "Impact controller configured with {} pooled blueprints",
            self.config.pool.entries.len()
        );
        Ok(())
    }

    fn on_frame_tick(&mut self, frame: &FrameContext) -> Vec<ImpactOutcome> {
        if !self.configured {
            log::warn!("Frame {} ticked before configure, ignoring", frame.frame_index);
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        if self.source.detected() {
            // A fresh detection cancels any pending reload and fires at once.
            match self.fire() {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => log::warn!("Shot in frame {} failed: {err}", frame.frame_index),
            }
            self.reload_timer = self.config.reload_interval;
        }

        if self.reload_timer > 0.0 {
            self.reload_timer -= frame.delta_time;
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::MarkBlueprint;
    use crate::scene::{Scene, SceneObject, TargetFlags};
    use crate::settings::{MarkSettings, TagBlueprints};
    use crate::source::ManualImpactSource;
    use glam::Vec2;
    use ricochet_core::{primitives, Aabb};
    use ricochet_pool::PoolConfig;

    /// Ignores the coordinate and always shoots straight down through `x, z`.
    struct DownwardRays;

    impl RaySource for DownwardRays {
        fn screen_point_to_ray(&self, coordinate: Vec2) -> Ray {
            Ray::new(Vec3::new(coordinate.x, 5.0, coordinate.y), Vec3::NEG_Y)
        }
    }

    fn config() -> ImpactConfig {
        ImpactConfig {
            random_rotation: false,
            rng_seed: Some(1),
            force: 3.0,
            pool: PoolConfig::default().with_entry("hole".to_string(), 2),
            marks: MarkSettings::default()
                .with_mark(TagBlueprints::new("Floor", ["hole"]))
                .with_effect(TagBlueprints::new("Floor", ["dust"])),
            ..Default::default()
        }
    }

    fn store() -> MarkStore {
        MarkStore::new()
            .with_blueprint("hole", MarkBlueprint { scale: Vec3::splat(0.5) })
            .with_blueprint("dust", MarkBlueprint::default())
    }

    fn controller(scene: Scene) -> ImpactController<ManualImpactSource, Scene, DownwardRays> {
        let mut controller =
            ImpactController::new(config(), ManualImpactSource::new(), scene, DownwardRays, store());
        controller.configure().unwrap();
        controller
    }

    fn frame(index: u64) -> FrameContext {
        FrameContext {
            frame_index: index,
            delta_time: 0.05,
        }
    }

    #[test]
    fn configure_rejects_unregistered_blueprints() {
        let mut controller = ImpactController::new(
            config(),
            ManualImpactSource::new(),
            Scene::new(),
            DownwardRays,
            MarkStore::new(),
        );
        assert!(matches!(
            controller.configure(),
            Err(RicochetError::InvalidConfiguration(_))
        ));
        assert!(!controller.is_configured());
    }

    #[test]
    fn ticks_before_configure_do_nothing() {
        let mut controller = ImpactController::new(
            config(),
            ManualImpactSource::new(),
            Scene::new(),
            DownwardRays,
            store(),
        );
        controller.source_mut().trigger(Vec2::ZERO);
        assert!(controller.on_frame_tick(&frame(0)).is_empty());
    }

    #[test]
    fn detection_fires_and_arms_reload_timer() {
        let scene = Scene::new();
        scene.add(SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 4)));
        let mut controller = controller(scene);

        assert!(controller.on_frame_tick(&frame(0)).is_empty());

        controller.source_mut().trigger(Vec2::new(0.3, 0.2));
        let outcomes = controller.on_frame_tick(&frame(1));
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], ImpactOutcome::Decal { effect: Some(_), .. }));
        assert!((controller.reload_timer() - 0.05).abs() < 1e-6);

        // No detection: the timer keeps counting down.
        assert!(controller.on_frame_tick(&frame(2)).is_empty());
        assert!(controller.reload_timer() < 1e-6);
    }

    #[test]
    fn detection_during_reload_fires_at_once() {
        let scene = Scene::new();
        scene.add(SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 4)));
        let mut controller = controller(scene);

        controller.source_mut().trigger(Vec2::new(0.3, 0.2));
        assert_eq!(controller.on_frame_tick(&frame(0)).len(), 1);
        assert!(controller.reload_timer() > 0.0);

        controller.source_mut().trigger(Vec2::new(-0.3, 0.2));
        assert_eq!(controller.on_frame_tick(&frame(1)).len(), 1);
        assert!((controller.reload_timer() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn marks_are_posed_along_the_surface_normal() {
        let mut spun = config();
        spun.random_rotation = true;
        spun.mark_scale = 2.0;

        let scene = Scene::new();
        // Wall facing +X.
        scene.add(
            SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 2))
                .with_transform(Transform::from_position_rotation(
                    Vec3::ZERO,
                    glam::Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2),
                )),
        );
        let mut controller = ImpactController::new(spun, ManualImpactSource::new(), scene, DownwardRays, store());
        controller.configure().unwrap();

        let outcome = controller
            .fire_ray(&Ray::new(Vec3::new(5.0, 0.3, 0.2), Vec3::NEG_X))
            .unwrap();
        let ImpactOutcome::Decal { mark, normal, .. } = outcome else {
            panic!("expected a decal, got {outcome:?}");
        };
        assert!(normal.abs_diff_eq(Vec3::X, 1e-5));

        let transform = controller.marks().get(mark).unwrap().transform;
        assert!((transform.rotation * Vec3::Y).abs_diff_eq(Vec3::X, 1e-5));
        assert!(transform.scale.abs_diff_eq(Vec3::ONE, 1e-6));
        assert!(transform.position.abs_diff_eq(Vec3::new(0.0, 0.3, 0.2), 1e-5));
    }

    #[test]
    fn marks_are_recycled_through_the_pool() {
        let scene = Scene::new();
        let floor = scene.add(SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 4)));
        let mut controller = controller(scene);

        let mut marks = Vec::new();
        for x in [-1.0, 0.0, 1.0] {
            let ray = Ray::new(Vec3::new(x + 0.1, 5.0, 0.3), Vec3::NEG_Y);
            match controller.fire_ray(&ray).unwrap() {
                ImpactOutcome::Decal { mark, target, .. } => {
                    assert_eq!(target, floor);
                    marks.push(mark);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert_eq!(marks[2], marks[0]);
        assert_eq!(controller.pool().tracked_count(&"hole".to_string()), 2);
        let recycled = controller.marks().get(marks[2]).unwrap();
        assert!((recycled.transform.position.x - 1.1).abs() < 1e-5);
        assert_eq!(recycled.transform.scale, Vec3::splat(0.5));
        assert_eq!(recycled.parent, Some(floor));
    }

    #[test]
    fn unknown_tags_report_no_blueprint() {
        let scene = Scene::new();
        let wall = scene.add(SceneObject::mesh("Glass", primitives::create_quad(2.0, 2.0)));
        let mut controller = controller(scene);

        let outcome = controller
            .fire_ray(&Ray::new(Vec3::new(0.2, 5.0, 0.1), Vec3::NEG_Y))
            .unwrap();
        assert_eq!(
            outcome,
            ImpactOutcome::NoBlueprint {
                target: wall,
                tag: "Glass".to_string()
            }
        );
    }

    #[test]
    fn missed_refinement_falls_through_to_the_next_collider() {
        let scene = Scene::new();
        // Oversized box collider around a tiny crate the ray passes beside.
        let crate_id = scene.add(
            SceneObject::mesh("Floor", primitives::create_cube(0.2))
                .with_transform(Transform::from_position(Vec3::Y))
                .with_box_collider(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
                .with_flags(TargetFlags::RIGID_BODY),
        );
        let floor = scene.add(SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 2)));
        let mut controller = controller(scene);

        let outcome = controller
            .fire_ray(&Ray::new(Vec3::new(0.6, 5.0, 0.3), Vec3::NEG_Y))
            .unwrap();
        assert!(matches!(outcome, ImpactOutcome::Decal { target, .. } if target == floor));
        assert_eq!(controller.world().forces_on(crate_id).len(), 1);

        let mut strict = config();
        strict.second_hit_depth = 0;
        let scene = Scene::new();
        scene.add(
            SceneObject::mesh("Floor", primitives::create_cube(0.2))
                .with_transform(Transform::from_position(Vec3::Y))
                .with_box_collider(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))),
        );
        scene.add(SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 2)));
        let mut controller =
            ImpactController::new(strict, ManualImpactSource::new(), scene, DownwardRays, store());
        controller.configure().unwrap();
        let outcome = controller
            .fire_ray(&Ray::new(Vec3::new(0.6, 5.0, 0.3), Vec3::NEG_Y))
            .unwrap();
        assert_eq!(outcome, ImpactOutcome::Missed);
    }

    #[test]
    fn static_targets_are_baked_once() {
        let scene = Scene::new();
        scene.add(
            SceneObject::mesh("Floor", primitives::create_plane(4.0, 4.0, 4)).with_flags(TargetFlags::STATIC),
        );
        let mut controller = controller(scene);

        for _ in 0..3 {
            controller
                .fire_ray(&Ray::new(Vec3::new(0.2, 5.0, 0.1), Vec3::NEG_Y))
                .unwrap();
        }
        assert_eq!(controller.static_meshes().len(), 1);
    }

    #[test]
    fn empty_sky_is_a_miss() {
        let mut controller = controller(Scene::new());
        assert_eq!(
            controller.fire_ray(&Ray::new(Vec3::ZERO, Vec3::Y)).unwrap(),
            ImpactOutcome::Missed
        );
    }
}
