use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use glam::{Quat, Vec3};
use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::factory::InstanceFactory;
use crate::pool::take_from;

struct Slot<H> {
    capacity: usize,
    tracked: Mutex<VecDeque<H>>,
}

/// Pool that can be shared between threads.
///
/// The blueprint table is fixed at construction. Each blueprint's list has its
/// own lock, so takes of different blueprints never contend.
pub struct SharedInstancePool<B, H> {
    slots: HashMap<B, Slot<H>>,
}

impl<B, H> SharedInstancePool<B, H>
where
    B: Eq + Hash + Clone + Debug,
    H: Clone,
{
    pub fn from_config(config: &PoolConfig<B>) -> Self {
        let slots = config
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.blueprint.clone(),
                    Slot {
                        capacity: entry.capacity,
                        tracked: Mutex::new(VecDeque::with_capacity(entry.capacity)),
                    },
                )
            })
            .collect();
        Self { slots }
    }

    pub fn capacity(&self, blueprint: &B) -> Option<usize> {
        self.slots.get(blueprint).map(|slot| slot.capacity)
    }

    pub fn is_configured(&self, blueprint: &B) -> bool {
        self.slots.contains_key(blueprint)
    }

    pub fn tracked_count(&self, blueprint: &B) -> usize {
        self.slots
            .get(blueprint)
            .map_or(0, |slot| slot.tracked.lock().len())
    }

    /// Same contract as [`crate::InstancePool::take`]. The factory runs while
    /// the blueprint's lock is held.
    pub fn take<F>(&self, factory: &mut F, blueprint: &B, position: Vec3, rotation: Quat) -> H
    where
        F: InstanceFactory<B, Handle = H>,
    {
        match self.slots.get(blueprint) {
            Some(slot) if slot.capacity > 0 => {
                let mut list = slot.tracked.lock();
                take_from(&mut list, slot.capacity, factory, blueprint, position, rotation)
            }
            _ => factory.instantiate(blueprint, position, rotation),
        }
    }
}
