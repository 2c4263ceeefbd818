//! Deterministic heightmap synthesis and height-based colour lookup.
#![forbid(unsafe_code)]

pub mod color;
pub mod falloff;
mod noise_field;

pub use color::{ColorMap, Region, RegionTable, Rgba, classify};
pub use falloff::{apply_falloff, generate_falloff_map};
pub use noise_field::{
    HeightMap, MIN_SCALE, NoiseSettings, NormalizeMode, generate_height_map, max_possible_height,
};
