//! Where impacts come from: a native detector, or a scripted list of shots.

use std::collections::VecDeque;

use glam::Vec2;

pub trait ImpactSource {
    /// Whether an impact is pending this frame.
    fn detected(&mut self) -> bool;

    /// Screen coordinate of the pending impact, origin bottom-left.
    fn coordinate(&self) -> Vec2;

    /// Marks the pending impact as consumed.
    fn reset(&mut self);
}

/// Queue of shots, one delivered per frame. Handy for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct ManualImpactSource {
    queued: VecDeque<Vec2>,
    current: Option<Vec2>,
    last: Vec2,
}

impl ManualImpactSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self, coordinate: Vec2) {
        self.queued.push_back(coordinate);
    }

    pub fn pending(&self) -> usize {
        self.queued.len() + usize::from(self.current.is_some())
    }
}

impl ImpactSource for ManualImpactSource {
    fn detected(&mut self) -> bool {
        if self.current.is_none() {
            self.current = self.queued.pop_front();
        }
        if let Some(coordinate) = self.current {
            self.last = coordinate;
            true
        } else {
            false
        }
    }

    fn coordinate(&self) -> Vec2 {
        self.last
    }

    fn reset(&mut self) {
        self.current = None;
    }
}

/// Raw interface of a native detector, e.g. a camera-based laser tracker.
pub trait DetectionBridge {
    fn did_detect(&mut self) -> bool;
    fn coordinate_x(&self) -> f32;
    fn coordinate_y(&self) -> f32;
    fn reset_detection(&mut self);
}

/// Adapts a [`DetectionBridge`] to [`ImpactSource`].
#[derive(Debug)]
pub struct BridgeImpactSource<B> {
    bridge: B,
}

impl<B: DetectionBridge> BridgeImpactSource<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn into_inner(self) -> B {
        self.bridge
    }
}

impl<B: DetectionBridge> ImpactSource for BridgeImpactSource<B> {
    fn detected(&mut self) -> bool {
        self.bridge.did_detect()
    }

    fn coordinate(&self) -> Vec2 {
        Vec2::new(self.bridge.coordinate_x(), self.bridge.coordinate_y())
    }

    fn reset(&mut self) {
        self.bridge.reset_detection();
    }
}
