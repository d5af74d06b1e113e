//! Headless shooting range: a scripted session of shots against a small scene.
//!
//! Pass a JSON config path as the first argument to override the built-in one.
//! Run with `RUST_LOG=debug` to see every mark being placed.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use ricochet::prelude::glam::{Quat, Vec2, Vec3};
use ricochet::prelude::*;
use ricochet::impact::ManualImpactSource;

const CONFIG: &str = r#"{
    "rng_seed": 42,
    "force": 4.0,
    "reload_interval": 0.25,
    "pool": {
        "entries": [
            { "blueprint": "bullet_hole_concrete", "capacity": 6 },
            { "blueprint": "bullet_hole_wood", "capacity": 4 },
            { "blueprint": "scorch", "capacity": 4 }
        ]
    },
    "marks": {
        "marks": [
            { "tag": "Concrete", "blueprints": ["bullet_hole_concrete"] },
            { "tag": "Wood", "blueprints": ["bullet_hole_wood"] },
            { "tag": "Ground", "blueprints": ["scorch"] }
        ],
        "effects": [
            { "tag": "Concrete", "blueprints": ["dust_puff"] },
            { "tag": "Wood", "blueprints": ["splinters"] }
        ]
    }
}"#;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Starting Ricochet shooting range");

    let config = match std::env::args().nth(1) {
        Some(path) => ImpactConfig::load(path)?,
        None => ImpactConfig::from_json_str(CONFIG)?,
    };

    let scene = build_scene()?;
    let mut camera = Camera::new_perspective(
        std::f32::consts::FRAC_PI_3,
        Viewport::new(1280, 720),
        0.1,
        500.0,
    );
    camera.position = Vec3::new(0.0, 3.0, 9.0);
    camera.look_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);

    let marks = MarkStore::new()
        .with_blueprint("bullet_hole_concrete", MarkBlueprint { scale: Vec3::splat(0.3) })
        .with_blueprint("bullet_hole_wood", MarkBlueprint { scale: Vec3::splat(0.25) })
        .with_blueprint("scorch", MarkBlueprint { scale: Vec3::new(1.2, 0.6, 1.2) })
        .with_blueprint("dust_puff", MarkBlueprint::default())
        .with_blueprint("splinters", MarkBlueprint::default());

    let mut controller = ImpactController::new(config, ManualImpactSource::new(), scene, camera, marks);
    controller.configure()?;

    let script = shot_script();
    let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();

    for frame_index in 0..240u64 {
        for (_, pixel) in script.iter().filter(|(frame, _)| *frame == frame_index) {
            controller.source_mut().trigger(*pixel);
        }

        let frame = FrameContext {
            frame_index,
            delta_time: 1.0 / 60.0,
        };
        for outcome in controller.on_frame_tick(&frame) {
            let kind = match &outcome {
                ImpactOutcome::Decal { target, triangles, .. } => {
                    log::info!("frame {frame_index}: decal on target {target} ({triangles} triangles)");
                    "decal"
                }
                ImpactOutcome::Empty { target, .. } => {
                    log::info!("frame {frame_index}: mark on target {target} touched nothing");
                    "empty"
                }
                ImpactOutcome::Missed => "missed",
                ImpactOutcome::NoBlueprint { tag, .. } => {
                    log::info!("frame {frame_index}: nothing configured for '{tag}'");
                    "no blueprint"
                }
            };
            *tally.entry(kind).or_default() += 1;
        }
    }

    // Pack every decal the way a renderer would upload it.
    let mut triangles = 0;
    let mut upload_bytes = 0;
    for (id, instance) in controller.marks().iter() {
        if instance.mesh.is_empty() {
            continue;
        }
        let vertices: Vec<Vertex> = instance.mesh.to_vertices();
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        log::debug!("{id:?} ({}): {} vertex bytes", instance.blueprint, bytes.len());
        triangles += instance.mesh.triangle_count();
        upload_bytes += bytes.len();
    }
    log::info!(
        "Session done: {tally:?}, {} live instances, {triangles} decal triangles, {upload_bytes} bytes to upload",
        controller.marks().len()
    );
    Ok(())
}

fn build_scene() -> Result<Scene> {
    let scene = Scene::new();

    let heights: Vec<f32> = (0..33 * 33)
        .map(|i| {
            let (x, z) = ((i % 33) as f32 / 32.0, (i / 33) as f32 / 32.0);
            0.5 + 0.5 * (x * 6.0).sin() * (z * 4.0).cos()
        })
        .collect();
    let terrain = Terrain::new(Heightmap::from_heights(33, 33, heights)?, Vec3::new(40.0, 1.5, 40.0))
        .with_transform(Transform::from_position(Vec3::new(-20.0, -1.5, -30.0)));
    scene.add(SceneObject::terrain("Ground", terrain));

    scene.add(SceneObject::mesh("Concrete", primitives::create_plane(12.0, 12.0, 6)).with_flags(TargetFlags::STATIC));

    scene.add(
        SceneObject::mesh("Concrete", primitives::create_quad(8.0, 4.0))
            .with_transform(Transform::from_position_rotation(
                Vec3::new(0.0, 2.0, -6.0),
                Quat::from_rotation_x(FRAC_PI_2),
            ))
            .with_flags(TargetFlags::STATIC),
    );

    for (i, x) in [-2.5f32, 0.0, 2.5].into_iter().enumerate() {
        scene.add(
            SceneObject::mesh("Wood", primitives::create_cube(1.0))
                .with_transform(Transform::new(
                    Vec3::new(x, 0.5, -1.0 - i as f32),
                    Quat::from_rotation_y(0.3 * i as f32),
                    Vec3::ONE,
                ))
                .with_flags(TargetFlags::RIGID_BODY),
        );
    }

    scene.add(SceneObject::mesh("Glass", primitives::create_quad(1.0, 1.0)).with_transform(
        Transform::from_position_rotation(Vec3::new(4.0, 1.5, -2.0), Quat::from_rotation_x(FRAC_PI_2)),
    ));

    Ok(scene)
}

/// `(frame, pixel)` pairs, pixel origin at the bottom-left of the viewport.
fn shot_script() -> Vec<(u64, Vec2)> {
    let mut script = Vec::new();
    for i in 0..24u64 {
        let column = (i % 8) as f32;
        let row = (i / 8) as f32;
        script.push((i * 9, Vec2::new(180.0 + column * 130.0, 120.0 + row * 200.0)));
    }
    script.push((230, Vec2::new(640.0, 719.0)));
    script
}
