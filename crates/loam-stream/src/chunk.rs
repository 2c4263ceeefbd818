use std::sync::Arc;

use loam_geom::{Bounds2, Vec2};
use loam_mesh::TerrainMesh;
use loam_noise::HeightMap;
use loam_runtime::Scheduler;
use loam_world::{ChunkCoord, LodInfo};

use crate::sink::TerrainSink;

/// Where a chunk is in its generation pipeline.
///
/// `MeshPending` and `MeshReady` name the LOD level of the mesh the chunk is
/// waiting for or currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStage {
    Created,
    HeightPending,
    HeightReady,
    MeshPending(u32),
    MeshReady(u32),
}

/// Distance-to-LOD table with the derived view range and collider slot.
#[derive(Clone, Debug)]
pub(crate) struct LodTable {
    lods: Vec<LodInfo>,
    collider: Option<usize>,
    max_view: f32,
}

impl LodTable {
    pub(crate) fn new(lods: Vec<LodInfo>) -> Self {
        let collider = lods.iter().position(|l| l.use_for_collider);
        let max_view = lods.last().map_or(0.0, |l| l.visible_distance);
        Self {
            lods,
            collider,
            max_view,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.lods.len()
    }

    #[inline]
    pub(crate) fn max_view(&self) -> f32 {
        self.max_view
    }

    #[inline]
    pub(crate) fn level(&self, index: usize) -> u32 {
        self.lods[index].lod
    }

    #[inline]
    pub(crate) fn threshold(&self, index: usize) -> f32 {
        self.lods[index].visible_distance
    }

    pub(crate) fn index_of(&self, lod: u32) -> Option<usize> {
        self.lods.iter().position(|l| l.lod == lod)
    }

    /// First entry whose threshold covers `distance`; the last entry otherwise.
    pub(crate) fn select(&self, distance: f32) -> usize {
        let last = self.lods.len().saturating_sub(1);
        self.lods[..last]
            .iter()
            .position(|l| distance <= l.visible_distance)
            .unwrap_or(last)
    }
}

#[derive(Clone, Debug, Default)]
struct LodSlot {
    requested: bool,
    mesh: Option<Arc<TerrainMesh>>,
}

/// Everything `TerrainChunk::update` reads from its owner.
pub(crate) struct UpdateCtx<'a, S> {
    pub viewer: Vec2,
    pub lods: &'a LodTable,
    pub scheduler: &'a Scheduler,
    pub sink: &'a mut S,
}

pub(crate) struct TerrainChunk {
    coord: ChunkCoord,
    bounds: Bounds2,
    stage: ChunkStage,
    height: Option<Arc<HeightMap>>,
    slots: Vec<LodSlot>,
    displayed: Option<usize>,
    collider_sent: bool,
    visible: bool,
}

impl TerrainChunk {
    pub(crate) fn new(coord: ChunkCoord, chunk_world_size: f32, lod_count: usize) -> Self {
        let [x, y] = coord.world_center(chunk_world_size);
        Self {
            coord,
            bounds: Bounds2::from_center_size(Vec2::new(x, y), chunk_world_size),
            stage: ChunkStage::Created,
            height: None,
            slots: vec![LodSlot::default(); lod_count],
            displayed: None,
            collider_sent: false,
            visible: false,
        }
    }

    #[inline]
    pub(crate) fn bounds(&self) -> Bounds2 {
        self.bounds
    }

    #[inline]
    pub(crate) fn stage(&self) -> ChunkStage {
        self.stage
    }

    #[inline]
    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub(crate) fn has_collider(&self) -> bool {
        self.collider_sent
    }

    #[inline]
    pub(crate) fn displayed_index(&self) -> Option<usize> {
        self.displayed
    }

    /// Slot indices holding a finished mesh.
    pub(crate) fn cached_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.mesh.is_some())
            .map(|(i, _)| i)
    }

    pub(crate) fn mark_height_requested(&mut self) {
        self.stage = ChunkStage::HeightPending;
    }

    pub(crate) fn set_height(&mut self, map: Arc<HeightMap>) {
        self.height = Some(map);
        if matches!(self.stage, ChunkStage::Created | ChunkStage::HeightPending) {
            self.stage = ChunkStage::HeightReady;
        }
    }

    pub(crate) fn store_mesh(&mut self, index: usize, mesh: Arc<TerrainMesh>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.requested = true;
            slot.mesh = Some(mesh);
        }
    }

    /// Hides the chunk, telling the sink when that changes anything.
    pub(crate) fn hide<S: TerrainSink>(&mut self, sink: &mut S) {
        if self.visible {
            self.visible = false;
            sink.set_visible(self.coord, false);
        }
    }

    /// Re-evaluates visibility, displayed LOD and collider against the viewer.
    ///
    /// Does nothing until the heightmap has arrived. Each LOD mesh is requested
    /// at most once over the chunk's lifetime. The collider mesh is requested once
    /// the viewer is inside the collider entry's threshold and handed to the sink
    /// once built. Returns the new visibility.
    pub(crate) fn update<S: TerrainSink>(&mut self, ctx: &mut UpdateCtx<'_, S>) -> bool {
        let Some(map) = self.height.clone() else {
            return self.visible;
        };
        let distance = self.bounds.distance(ctx.viewer);
        let visible = distance <= ctx.lods.max_view();

        if visible {
            let index = ctx.lods.select(distance);
            let lod = ctx.lods.level(index);
            if self.displayed == Some(index) {
                // Back in the band already on screen; any other pending LOD stays cached.
                self.stage = ChunkStage::MeshReady(lod);
            } else if let Some(mesh) = &self.slots[index].mesh {
                self.displayed = Some(index);
                self.stage = ChunkStage::MeshReady(lod);
                ctx.sink.set_mesh(self.coord, mesh);
            } else {
                if !self.slots[index].requested {
                    self.slots[index].requested = true;
                    ctx.scheduler.request_mesh(self.coord, map.clone(), lod);
                }
                self.stage = ChunkStage::MeshPending(lod);
            }

            // Collision follows its own distance band, not the displayed LOD.
            if let Some(ci) = ctx.lods.collider {
                if !self.collider_sent && distance <= ctx.lods.threshold(ci) {
                    let slot = &mut self.slots[ci];
                    if let Some(mesh) = &slot.mesh {
                        ctx.sink.set_collider(self.coord, mesh);
                        self.collider_sent = true;
                    } else if !slot.requested {
                        slot.requested = true;
                        ctx.scheduler
                            .request_mesh(self.coord, map.clone(), ctx.lods.level(ci));
                    }
                }
            }
        }

        if visible != self.visible {
            self.visible = visible;
            ctx.sink.set_visible(self.coord, visible);
        }
        visible
    }
}
