use hashbrown::{HashMap, HashSet};
use loam_geom::Vec2;
use loam_runtime::{Completed, JobResult, Scheduler};
use loam_world::{ChunkCoord, LodInfo, TerrainParams};

use crate::chunk::{ChunkStage, LodTable, TerrainChunk, UpdateCtx};
use crate::sink::TerrainSink;

#[derive(Clone, Debug)]
pub struct StreamParams {
    /// World extent of one chunk in mesh units (`edge - 1`).
    pub chunk_world_size: f32,
    pub world_scale: f32,
    /// Viewer travel, in mesh units, that triggers a visibility recompute.
    pub move_threshold: f32,
    pub lods: Vec<LodInfo>,
}

impl StreamParams {
    pub fn from_terrain(p: &TerrainParams) -> Self {
        Self {
            chunk_world_size: p.chunk_world_size(),
            world_scale: p.world_scale,
            move_threshold: p.move_threshold,
            lods: p.lods.clone(),
        }
    }
}

/// Owns every terrain chunk and keeps the set around the viewer generated and shown.
///
/// Chunks are created on first sight and live for the streamer's lifetime.
/// All chunk state changes happen on the caller's thread, inside
/// [`ChunkStreamer::on_viewer_moved`] or while dispatching drained results.
pub struct ChunkStreamer<S: TerrainSink> {
    params: StreamParams,
    lods: LodTable,
    scheduler: Scheduler,
    sink: S,
    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible_last_update: HashSet<ChunkCoord>,
    viewer: Vec2,
    last_update_pos: Option<Vec2>,
    chunks_visible_in_view: i32,
}

impl<S: TerrainSink> ChunkStreamer<S> {
    pub fn new(params: StreamParams, scheduler: Scheduler, sink: S) -> Self {
        let lods = LodTable::new(params.lods.clone());
        let chunks_visible_in_view = if params.chunk_world_size > 0.0 {
            (lods.max_view() / params.chunk_world_size).ceil() as i32
        } else {
            0
        };
        Self {
            params,
            lods,
            scheduler,
            sink,
            chunks: HashMap::new(),
            visible_last_update: HashSet::new(),
            viewer: Vec2::ZERO,
            last_update_pos: None,
            chunks_visible_in_view,
        }
    }

    /// Records the viewer at world position `(x, z)` and recomputes visibility once
    /// it has moved far enough since the last recompute.
    pub fn on_viewer_moved(&mut self, world_pos: Vec2) {
        self.viewer = world_pos / self.params.world_scale;
        let due = match self.last_update_pos {
            None => true,
            Some(last) => {
                let t = self.params.move_threshold;
                self.viewer.distance_sq(last) > t * t
            }
        };
        if due {
            self.last_update_pos = Some(self.viewer);
            self.update_visible_chunks();
        }
    }

    /// Moves the viewer, then dispatches every result completed so far.
    /// Returns the number of results dispatched.
    pub fn tick(&mut self, world_pos: Vec2) -> usize {
        self.on_viewer_moved(world_pos);
        self.process_completed()
    }

    /// Drains the scheduler once and applies each result to its chunk.
    pub fn process_completed(&mut self) -> usize {
        let batch = self.scheduler.drain();
        let n = batch.len();
        for completed in batch {
            self.dispatch(completed);
        }
        n
    }

    fn dispatch(&mut self, completed: Completed) {
        let Completed { coord, result } = completed;
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            log::warn!(target: "stream", "result for unknown chunk ({}, {})", coord.cx, coord.cy);
            return;
        };
        match result {
            JobResult::Height(data) => {
                log::trace!(target: "stream", "height ready ({}, {})", coord.cx, coord.cy);
                chunk.set_height(data.height_map);
                self.sink.set_color_map(coord, &data.color_map);
            }
            JobResult::Mesh { lod, mesh } => {
                log::trace!(target: "stream", "mesh ready ({}, {}) lod {lod}", coord.cx, coord.cy);
                match self.lods.index_of(lod) {
                    Some(index) => chunk.store_mesh(index, mesh),
                    None => {
                        log::warn!(target: "stream", "mesh for unconfigured lod {lod}");
                        return;
                    }
                }
            }
        }
        self.update_chunk(coord);
    }

    fn update_visible_chunks(&mut self) {
        let previous = std::mem::take(&mut self.visible_last_update);
        let size = self.params.chunk_world_size;
        let center = ChunkCoord::containing(self.viewer.x, self.viewer.y, size);
        log::debug!(
            target: "stream",
            "recompute around ({}, {}) radius {}",
            center.cx,
            center.cy,
            self.chunks_visible_in_view
        );

        for coord in center.window(self.chunks_visible_in_view) {
            if self.chunks.contains_key(&coord) {
                self.update_chunk(coord);
            } else {
                self.create_chunk(coord);
            }
        }

        // Anything shown last time but not re-confirmed now goes dark.
        for coord in previous {
            if self.visible_last_update.contains(&coord) {
                continue;
            }
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.hide(&mut self.sink);
            }
        }
    }

    fn create_chunk(&mut self, coord: ChunkCoord) {
        let size = self.params.chunk_world_size;
        let mut chunk = TerrainChunk::new(coord, size, self.lods.len());
        self.sink.chunk_created(coord, chunk.bounds());
        self.scheduler.request_height(coord, coord.world_center(size));
        chunk.mark_height_requested();
        log::debug!(target: "stream", "created chunk ({}, {})", coord.cx, coord.cy);
        self.chunks.insert(coord, chunk);
    }

    fn update_chunk(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let mut ctx = UpdateCtx {
            viewer: self.viewer,
            lods: &self.lods,
            scheduler: &self.scheduler,
            sink: &mut self.sink,
        };
        if chunk.update(&mut ctx) {
            self.visible_last_update.insert(coord);
        } else {
            self.visible_last_update.remove(&coord);
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Visible chunks, sorted.
    pub fn visible_chunks(&self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(_, c)| c.is_visible())
            .map(|(coord, _)| *coord)
            .collect();
        out.sort();
        out
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn stage(&self, coord: ChunkCoord) -> Option<ChunkStage> {
        self.chunks.get(&coord).map(|c| c.stage())
    }

    pub fn is_visible(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(|c| c.is_visible())
    }

    /// LOD level currently shown for `coord`.
    pub fn displayed_lod(&self, coord: ChunkCoord) -> Option<u32> {
        let index = self.chunks.get(&coord)?.displayed_index()?;
        Some(self.lods.level(index))
    }

    /// LOD levels with a finished mesh cached for `coord`.
    pub fn cached_lods(&self, coord: ChunkCoord) -> Vec<u32> {
        self.chunks.get(&coord).map_or_else(Vec::new, |c| {
            c.cached_indices().map(|i| self.lods.level(i)).collect()
        })
    }

    pub fn has_collider(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(|c| c.has_collider())
    }

    /// Viewer position in mesh units, as of the last `on_viewer_moved`.
    pub fn viewer_position(&self) -> Vec2 {
        self.viewer
    }

    /// Viewer position at the last visibility recompute.
    pub fn last_update_position(&self) -> Option<Vec2> {
        self.last_update_pos
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
