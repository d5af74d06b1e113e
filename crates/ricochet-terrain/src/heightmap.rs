use ricochet_core::{Result, RicochetError};
use serde::{Deserialize, Serialize};

/// Grid of normalized height samples, row-major with `x` varying fastest.
///
/// `width` runs along terrain X, `height` along terrain Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHeightmap")]
pub struct Heightmap {
    width: u32,
    height: u32,
    heights: Vec<f32>,
}

/// Unchecked wire form; deserialization goes through [`Heightmap::from_heights`].
#[derive(Deserialize)]
struct RawHeightmap {
    width: u32,
    height: u32,
    heights: Vec<f32>,
}

impl TryFrom<RawHeightmap> for Heightmap {
    type Error = RicochetError;

    fn try_from(raw: RawHeightmap) -> Result<Self> {
        Self::from_heights(raw.width, raw.height, raw.heights)
    }
}

impl Heightmap {
    /// Flat heightmap. Each side has at least two samples.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(2);
        let height = height.max(2);
        Self {
            width,
            height,
            heights: vec![0.0; (width * height) as usize],
        }
    }

    pub fn from_heights(width: u32, height: u32, heights: Vec<f32>) -> Result<Self> {
        if width < 2 || height < 2 {
            return Err(RicochetError::InvalidConfiguration(format!(
                "heightmap needs at least 2x2 samples, got {width}x{height}"
            )));
        }
        if heights.len() != (width as usize) * (height as usize) {
            return Err(RicochetError::InvalidConfiguration(format!(
                "{} height samples for a {width}x{height} heightmap",
                heights.len()
            )));
        }
        Ok(Self {
            width,
            height,
            heights,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-range samples read as zero.
    pub fn get_height(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        let index = (y * self.width + x) as usize;
        self.heights.get(index).copied().unwrap_or(0.0)
    }

    pub fn set_height(&mut self, x: u32, y: u32, height: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y * self.width + x) as usize;
        if let Some(h) = self.heights.get_mut(index) {
            *h = height;
        }
    }

    /// Bilinear sample at normalized `(u, v)`, clamped to the grid.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        let x = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let y = v.clamp(0.0, 1.0) * (self.height - 1) as f32;

        let x0 = (x.floor() as u32).min(self.width - 1);
        let y0 = (y.floor() as u32).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let h00 = self.get_height(x0, y0);
        let h10 = self.get_height(x1, y0);
        let h01 = self.get_height(x0, y1);
        let h11 = self.get_height(x1, y1);

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;

        h0 * (1.0 - fy) + h1 * fy
    }
}
