use glam::{Quat, Vec3};

/// Host side of a pool: creates instances of a blueprint and puts recycled
/// ones back into a fresh state.
pub trait InstanceFactory<B> {
    type Handle: Clone;

    fn instantiate(&mut self, blueprint: &B, position: Vec3, rotation: Quat) -> Self::Handle;

    /// Detach `handle` from any parent, restore the blueprint's original scale
    /// and move it to the new pose.
    fn recycle(&mut self, handle: &Self::Handle, blueprint: &B, position: Vec3, rotation: Quat);
}
