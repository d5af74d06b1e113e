use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use glam::{Quat, Vec3};

use crate::config::PoolConfig;
use crate::factory::InstanceFactory;

/// Bounded pool of live instances per blueprint.
///
/// Once a blueprint has `capacity` tracked instances, further takes recycle the
/// oldest one instead of creating more. Blueprints without an entry are never
/// tracked.
#[derive(Debug)]
pub struct InstancePool<B, H> {
    capacities: HashMap<B, usize>,
    tracked: HashMap<B, VecDeque<H>>,
}

impl<B, H> InstancePool<B, H>
where
    B: Eq + Hash + Clone + Debug,
    H: Clone,
{
    pub fn new() -> Self {
        Self {
            capacities: HashMap::new(),
            tracked: HashMap::new(),
        }
    }

    pub fn from_config(config: &PoolConfig<B>) -> Self {
        let mut pool = Self::new();
        for entry in &config.entries {
            pool.set_capacity(entry.blueprint.clone(), entry.capacity);
        }
        pool
    }

    /// Sets the budget for `blueprint`. Shrinking releases the oldest tracked
    /// instances from the pool's care; they stay alive in the host.
    pub fn set_capacity(&mut self, blueprint: B, capacity: usize) {
        if let Some(list) = self.tracked.get_mut(&blueprint) {
            while list.len() > capacity {
                list.pop_front();
            }
        }
        self.capacities.insert(blueprint, capacity);
    }

    pub fn capacity(&self, blueprint: &B) -> Option<usize> {
        self.capacities.get(blueprint).copied()
    }

    pub fn is_configured(&self, blueprint: &B) -> bool {
        self.capacities.contains_key(blueprint)
    }

    pub fn tracked_count(&self, blueprint: &B) -> usize {
        self.tracked.get(blueprint).map_or(0, VecDeque::len)
    }

    /// Tracked instances, oldest first.
    pub fn tracked(&self, blueprint: &B) -> impl Iterator<Item = &H> + '_ {
        self.tracked.get(blueprint).into_iter().flatten()
    }

    pub fn take<F>(&mut self, factory: &mut F, blueprint: &B, position: Vec3, rotation: Quat) -> H
    where
        F: InstanceFactory<B, Handle = H>,
    {
        let capacity = match self.capacities.get(blueprint) {
            Some(&capacity) if capacity > 0 => capacity,
            Some(_) => return factory.instantiate(blueprint, position, rotation),
            None => {
                log::trace!("Blueprint {:?} is not pooled", blueprint);
                return factory.instantiate(blueprint, position, rotation);
            }
        };

        let list = self.tracked.entry(blueprint.clone()).or_default();
        take_from(list, capacity, factory, blueprint, position, rotation)
    }
}

/// Shared by the single-threaded and locked pools.
pub(crate) fn take_from<B, H, F>(
    list: &mut VecDeque<H>,
    capacity: usize,
    factory: &mut F,
    blueprint: &B,
    position: Vec3,
    rotation: Quat,
) -> H
where
    B: Debug,
    H: Clone,
    F: InstanceFactory<B, Handle = H>,
{
    if list.len() < capacity {
        let handle = factory.instantiate(blueprint, position, rotation);
        list.push_back(handle.clone());
        log::debug!(
            "Pooled new instance of {:?} ({}/{})",
            blueprint,
            list.len(),
            capacity
        );
        return handle;
    }

    match list.pop_front() {
        Some(handle) => {
            factory.recycle(&handle, blueprint, position, rotation);
            list.push_back(handle.clone());
            log::trace!("Recycled oldest instance of {:?}", blueprint);
            handle
        }
        // Only reachable with capacity 0, which callers filter out.
        None => factory.instantiate(blueprint, position, rotation),
    }
}

impl<B, H> Default for InstancePool<B, H>
where
    B: Eq + Hash + Clone + Debug,
    H: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
