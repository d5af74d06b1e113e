//! Ricochet terrain - heightfields and the sampler that cuts a local triangle
//! patch out of them for decal projection.

pub mod heightmap;
pub mod sampler;
pub mod terrain;

pub use heightmap::Heightmap;
pub use sampler::TerrainSampler;
pub use terrain::Terrain;
