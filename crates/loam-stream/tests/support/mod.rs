#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use loam_geom::{Bounds2, Vec2};
use loam_mesh::TerrainMesh;
use loam_noise::ColorMap;
use loam_runtime::{Scheduler, SchedulerParams};
use loam_stream::{ChunkStreamer, StreamParams, TerrainSink};
use loam_world::{ChunkCoord, LodInfo, TerrainParams};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Created(ChunkCoord),
    Colors(ChunkCoord),
    Mesh(ChunkCoord, u32),
    Collider(ChunkCoord, u32),
    Visible(ChunkCoord, bool),
}

/// Records every sink call in order.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl RecordingSink {
    pub fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }
}

impl TerrainSink for RecordingSink {
    fn chunk_created(&mut self, coord: ChunkCoord, _bounds: Bounds2) {
        self.events.push(Event::Created(coord));
    }

    fn set_color_map(&mut self, coord: ChunkCoord, _colors: &Arc<ColorMap>) {
        self.events.push(Event::Colors(coord));
    }

    fn set_mesh(&mut self, coord: ChunkCoord, mesh: &Arc<TerrainMesh>) {
        self.events.push(Event::Mesh(coord, mesh.lod));
    }

    fn set_collider(&mut self, coord: ChunkCoord, mesh: &Arc<TerrainMesh>) {
        self.events.push(Event::Collider(coord, mesh.lod));
    }

    fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
        self.events.push(Event::Visible(coord, visible));
    }
}

/// Seed 1, scale 50, 4 octaves, 239-sample chunks, viewer units equal mesh units.
pub fn scenario_params(lods: Vec<LodInfo>) -> TerrainParams {
    let mut p = TerrainParams::default();
    p.edge = 239;
    p.world_scale = 1.0;
    p.noise.seed = 1;
    p.noise.scale = 50.0;
    p.noise.octaves = 4;
    p.noise.persistence = 0.5;
    p.noise.lacunarity = 2.0;
    p.lods = lods;
    p.worker_threads = 4;
    p
}

pub fn streamer(params: &TerrainParams) -> ChunkStreamer<RecordingSink> {
    let scheduler = Scheduler::new(SchedulerParams::from_terrain(params)).expect("pool");
    ChunkStreamer::new(
        StreamParams::from_terrain(params),
        scheduler,
        RecordingSink::default(),
    )
}

/// Ticks at `pos` until every job has finished and been dispatched.
pub fn settle<S: TerrainSink>(s: &mut ChunkStreamer<S>, pos: Vec2) {
    for _ in 0..64 {
        s.tick(pos);
        assert!(s.scheduler().wait_idle(Duration::from_secs(60)), "jobs never finished");
        if s.scheduler().pending_results() == 0 {
            return;
        }
    }
    panic!("streamer did not settle");
}
