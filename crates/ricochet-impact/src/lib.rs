//! Ricochet impact - turns detected shots into decals on whatever they hit.
//!
//! The host supplies a [`HostWorld`] for ray casts and surface geometry and a
//! [`RaySource`] (usually its [`ricochet_core::Camera`]); detections arrive
//! through an [`ImpactSource`]. [`ImpactController`] ties them together and is
//! driven through the [`HostSystem`] lifecycle.

pub mod controller;
pub mod host;
pub mod marks;
pub mod scene;
pub mod settings;
pub mod source;

pub use controller::{FrameContext, HostSystem, ImpactController, ImpactOutcome};
pub use host::{HostHit, HostWorld, RaySource, Surface, TargetId};
pub use marks::{DecalInstance, InstanceId, MarkBlueprint, MarkStore};
pub use scene::{AppliedForce, Collider, Geometry, Scene, SceneObject, TargetFlags};
pub use settings::{ImpactConfig, MarkSettings, TagBlueprints, UNTAGGED};
pub use source::{BridgeImpactSource, DetectionBridge, ImpactSource, ManualImpactSource};
