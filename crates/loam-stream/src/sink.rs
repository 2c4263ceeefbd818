use std::sync::Arc;

use loam_geom::Bounds2;
use loam_mesh::TerrainMesh;
use loam_noise::ColorMap;
use loam_world::ChunkCoord;

/// Receiver of everything the streamer wants shown.
///
/// Calls happen on the thread driving the streamer, during `on_viewer_moved`
/// or while dispatching drained results. Every method defaults to a no-op.
pub trait TerrainSink {
    /// A chunk was allocated; it starts hidden.
    fn chunk_created(&mut self, _coord: ChunkCoord, _bounds: Bounds2) {}

    fn set_color_map(&mut self, _coord: ChunkCoord, _colors: &Arc<ColorMap>) {}

    /// The mesh to render for `coord`, replacing any previous one.
    fn set_mesh(&mut self, _coord: ChunkCoord, _mesh: &Arc<TerrainMesh>) {}

    /// Collision geometry for `coord`. Sent at most once per chunk.
    fn set_collider(&mut self, _coord: ChunkCoord, _mesh: &Arc<TerrainMesh>) {}

    fn set_visible(&mut self, _coord: ChunkCoord, _visible: bool) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TerrainSink for NullSink {}
