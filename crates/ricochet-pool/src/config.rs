use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry<B> {
    pub blueprint: B,
    pub capacity: usize,
}

/// Which blueprints are pooled and how many instances each may keep alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig<B = String> {
    pub entries: Vec<PoolEntry<B>>,
    /// Capacity given to blueprints added through [`PoolConfig::register`].
    pub default_capacity: usize,
}

impl<B> Default for PoolConfig<B> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            default_capacity: 10,
        }
    }
}

impl<B: PartialEq> PoolConfig<B> {
    pub fn with_entry(mut self, blueprint: B, capacity: usize) -> Self {
        self.set_capacity(blueprint, capacity);
        self
    }

    /// Adds `blueprint` with the default capacity unless it is already listed.
    /// Returns whether an entry was added.
    pub fn register(&mut self, blueprint: B) -> bool {
        if self.contains(&blueprint) {
            return false;
        }
        self.entries.push(PoolEntry {
            blueprint,
            capacity: self.default_capacity,
        });
        true
    }

    pub fn set_capacity(&mut self, blueprint: B, capacity: usize) {
        match self.entries.iter_mut().find(|e| e.blueprint == blueprint) {
            Some(entry) => entry.capacity = capacity,
            None => self.entries.push(PoolEntry {
                blueprint,
                capacity,
            }),
        }
    }

    pub fn contains(&self, blueprint: &B) -> bool {
        self.entries.iter().any(|e| &e.blueprint == blueprint)
    }

    pub fn capacity(&self, blueprint: &B) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| &e.blueprint == blueprint)
            .map(|e| e.capacity)
    }
}
