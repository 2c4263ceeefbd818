//! Chunk addressing and terrain generation parameters.
#![forbid(unsafe_code)]

mod chunk_coord;
pub mod worldgen;

pub use chunk_coord::ChunkCoord;
pub use worldgen::{
    ConfigError, LodInfo, TerrainConfig, TerrainParams, load_config_from_path,
    load_params_from_path,
};
