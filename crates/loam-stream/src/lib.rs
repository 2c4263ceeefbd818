//! Viewer-driven chunk streaming: visibility, LOD selection, mesh swaps.
#![forbid(unsafe_code)]

mod chunk;
mod sink;
mod streamer;

pub use chunk::ChunkStage;
pub use sink::{NullSink, TerrainSink};
pub use streamer::{ChunkStreamer, StreamParams};
