//! Which marks go on which surfaces, and the knobs of the impact controller.

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use ricochet_core::{LayerMask, Result, RicochetError};
use ricochet_decals::ProjectorSettings;
use ricochet_pool::PoolConfig;
use serde::{Deserialize, Serialize};

/// Tag used for targets the host reports without one.
pub const UNTAGGED: &str = "Untagged";

/// Blueprints offered for targets carrying `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBlueprints {
    pub tag: String,
    pub blueprints: Vec<String>,
}

impl TagBlueprints {
    pub fn new(tag: impl Into<String>, blueprints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tag: tag.into(),
            blueprints: blueprints.into_iter().map(Into::into).collect(),
        }
    }
}

/// Mark and impact-effect blueprints, grouped by target tag.
///
/// A tag may appear in several groups; a lookup picks one group at random and
/// then one blueprint from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkSettings {
    pub marks: Vec<TagBlueprints>,
    pub effects: Vec<TagBlueprints>,
}

impl MarkSettings {
    pub fn with_mark(mut self, group: TagBlueprints) -> Self {
        self.marks.push(group);
        self
    }

    pub fn with_effect(mut self, group: TagBlueprints) -> Self {
        self.effects.push(group);
        self
    }

    pub fn mark_for<R: Rng + ?Sized>(&self, tag: &str, rng: &mut R) -> Option<&str> {
        pick(&self.marks, tag, rng)
    }

    pub fn effect_for<R: Rng + ?Sized>(&self, tag: &str, rng: &mut R) -> Option<&str> {
        pick(&self.effects, tag, rng)
    }

    /// Every blueprint named anywhere in the settings.
    pub fn blueprints(&self) -> impl Iterator<Item = &str> + '_ {
        self.marks
            .iter()
            .chain(&self.effects)
            .flat_map(|group| group.blueprints.iter().map(String::as_str))
    }
}

fn pick<'a, R: Rng + ?Sized>(groups: &'a [TagBlueprints], tag: &str, rng: &mut R) -> Option<&'a str> {
    let matching: Vec<&TagBlueprints> = groups.iter().filter(|g| g.tag == tag).collect();
    let group = matching.choose(rng)?;
    group.blueprints.choose(rng).map(String::as_str)
}

/// Everything the impact controller can be tuned with. Loadable from JSON;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Spin each mark by a random angle about the surface normal.
    pub random_rotation: bool,
    pub max_distance: f32,
    pub layer_mask: LayerMask,
    /// Impulse along the ray applied to rigid bodies that are hit. Zero disables it.
    pub force: f32,
    /// Multiplies the blueprint scale of every mark.
    pub mark_scale: f32,
    /// Seconds between shots while detections keep arriving.
    pub reload_interval: f32,
    /// How many times a missed mesh refinement may fall back to the next collider.
    pub second_hit_depth: u32,
    /// Fixed seed for reproducible spins and blueprint choices.
    pub rng_seed: Option<u64>,
    /// Keep baked copies of static meshes between shots.
    pub cache_static_meshes: bool,
    pub interpolate_normals: bool,
    pub projector: ProjectorSettings,
    pub pool: PoolConfig,
    pub marks: MarkSettings,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            random_rotation: true,
            max_distance: f32::MAX,
            layer_mask: LayerMask::ALL,
            force: 0.0,
            mark_scale: 1.0,
            reload_interval: 0.1,
            second_hit_depth: 1,
            rng_seed: None,
            cache_static_meshes: true,
            interpolate_normals: false,
            projector: ProjectorSettings::default(),
            pool: PoolConfig::default(),
            marks: MarkSettings::default(),
        }
    }
}

impl ImpactConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_distance.is_nan() || self.max_distance <= 0.0 {
            return Err(RicochetError::InvalidConfiguration(format!(
                "max_distance must be positive, got {}",
                self.max_distance
            )));
        }
        if !self.mark_scale.is_finite() || self.mark_scale <= 0.0 {
            return Err(RicochetError::InvalidConfiguration(format!(
                "mark_scale must be positive, got {}",
                self.mark_scale
            )));
        }
        if !self.reload_interval.is_finite() || self.reload_interval < 0.0 {
            return Err(RicochetError::InvalidConfiguration(format!(
                "reload_interval must be non-negative, got {}",
                self.reload_interval
            )));
        }
        if self.projector.texture_scale == 0.0 {
            return Err(RicochetError::InvalidConfiguration(
                "projector.texture_scale must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings() -> MarkSettings {
        MarkSettings::default()
            .with_mark(TagBlueprints::new("Metal", ["metal_hole_a", "metal_hole_b"]))
            .with_mark(TagBlueprints::new("Wood", ["wood_hole"]))
            .with_effect(TagBlueprints::new("Metal", ["sparks"]))
    }

    #[test]
    fn lookup_picks_only_matching_tags() {
        let settings = settings();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let mark = settings.mark_for("Metal", &mut rng).unwrap();
            assert!(mark.starts_with("metal_hole"));
        }
        assert_eq!(settings.mark_for("Wood", &mut rng), Some("wood_hole"));
        assert_eq!(settings.effect_for("Wood", &mut rng), None);
        assert_eq!(settings.mark_for("Glass", &mut rng), None);
        assert_eq!(settings.blueprints().count(), 4);
    }

    #[test]
    fn config_parses_partial_json() {
        let config = ImpactConfig::from_json_str(
            r#"{
                "force": 12.5,
                "layer_mask": 5,
                "rng_seed": 42,
                "projector": { "surface_offset": 0.01 },
                "pool": { "entries": [ { "blueprint": "wood_hole", "capacity": 20 } ] },
                "marks": { "marks": [ { "tag": "Wood", "blueprints": ["wood_hole"] } ] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.force, 12.5);
        assert_eq!(config.layer_mask, LayerMask(5));
        assert_eq!(config.second_hit_depth, 1);
        assert_eq!(config.projector.backface_threshold, 0.05);
        assert_eq!(config.pool.capacity(&"wood_hole".to_string()), Some(20));
        assert!(config.random_rotation);
    }

    #[test]
    fn config_rejects_nonsense() {
        assert!(matches!(
            ImpactConfig::from_json_str(r#"{ "mark_scale": -1.0 }"#),
            Err(RicochetError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ImpactConfig::from_json_str("{ not json"),
            Err(RicochetError::Json(_))
        ));
        assert!(matches!(
            ImpactConfig::load("/definitely/not/here.json"),
            Err(RicochetError::Io(_))
        ));
    }
}
