//! In-crate instance store standing in for host scene objects.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use ricochet_core::Transform;
use ricochet_decals::DecalMesh;
use ricochet_pool::InstanceFactory;
use serde::{Deserialize, Serialize};

use crate::host::TargetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// Template a mark or effect instance is created from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkBlueprint {
    /// Original scale; for marks this is the size of the decal box.
    pub scale: Vec3,
}

impl Default for MarkBlueprint {
    fn default() -> Self {
        Self { scale: Vec3::ONE }
    }
}

/// A live mark or effect. `mesh` stays empty for effects and for marks whose
/// projection touched nothing.
#[derive(Debug, Clone)]
pub struct DecalInstance {
    pub blueprint: String,
    pub transform: Transform,
    pub parent: Option<TargetId>,
    pub mesh: DecalMesh,
}

#[derive(Debug, Default)]
pub struct MarkStore {
    blueprints: HashMap<String, MarkBlueprint>,
    instances: HashMap<InstanceId, DecalInstance>,
    next_id: u64,
}

impl MarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, blueprint: MarkBlueprint) {
        self.blueprints.insert(name.into(), blueprint);
    }

    pub fn with_blueprint(mut self, name: impl Into<String>, blueprint: MarkBlueprint) -> Self {
        self.register(name, blueprint);
        self
    }

    pub fn has_blueprint(&self, name: &str) -> bool {
        self.blueprints.contains_key(name)
    }

    pub fn get(&self, id: InstanceId) -> Option<&DecalInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut DecalInstance> {
        self.instances.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &DecalInstance)> + '_ {
        self.instances.iter().map(|(&id, instance)| (id, instance))
    }

    /// Instances currently attached to `target`.
    pub fn children_of(&self, target: TargetId) -> impl Iterator<Item = (InstanceId, &DecalInstance)> + '_ {
        self.iter().filter(move |(_, i)| i.parent == Some(target))
    }

    /// Stores the projected geometry and parents the instance to `target`.
    /// An empty mesh clears whatever the instance showed before.
    pub fn attach(&mut self, id: InstanceId, target: TargetId, mesh: DecalMesh) -> bool {
        match self.instances.get_mut(&id) {
            Some(instance) => {
                instance.parent = Some(target);
                instance.mesh = mesh;
                true
            }
            None => false,
        }
    }

    fn scale_of(&self, blueprint: &str) -> Vec3 {
        self.blueprints
            .get(blueprint)
            .map_or(Vec3::ONE, |b| b.scale)
    }
}

impl InstanceFactory<String> for MarkStore {
    type Handle = InstanceId;

    fn instantiate(&mut self, blueprint: &String, position: Vec3, rotation: Quat) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;

        let transform = Transform::new(position, rotation, self.scale_of(blueprint));
        self.instances.insert(
            id,
            DecalInstance {
                blueprint: blueprint.clone(),
                transform,
                parent: None,
                mesh: DecalMesh::new(),
            },
        );
        id
    }

    fn recycle(&mut self, handle: &InstanceId, blueprint: &String, position: Vec3, rotation: Quat) {
        let scale = self.scale_of(blueprint);
        if let Some(instance) = self.instances.get_mut(handle) {
            instance.parent = None;
            instance.transform = Transform::new(position, rotation, scale);
        }
    }
}
