//! Ricochet pool - bounded instance pools keyed by blueprint.
//!
//! Pools allow short-lived scene objects (decals, impact effects) to be reused
//! once a blueprint's budget is spent, recycling the oldest instance first.

mod config;
mod factory;
mod pool;
mod shared;

pub use config::{PoolConfig, PoolEntry};
pub use factory::InstanceFactory;
pub use pool::InstancePool;
pub use shared::SharedInstancePool;
