use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Maps a pixel coordinate (origin bottom-left) to normalized device
    /// coordinates in `[-1, 1]`.
    pub fn to_ndc(&self, pixel: Vec2) -> Vec2 {
        let local = pixel - Vec2::new(self.x as f32, self.y as f32);
        let size = Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32);
        local / size * 2.0 - Vec2::ONE
    }
}
