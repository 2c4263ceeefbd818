use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use loam_geom::{Bounds2, Vec2};
use loam_mesh::TerrainMesh;
use loam_noise::ColorMap;
use loam_runtime::{Scheduler, SchedulerParams};
use loam_stream::{ChunkStreamer, StreamParams, TerrainSink};
use loam_world::{ChunkCoord, TerrainParams};
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub ticks: u32,
    pub speed: f32,
    pub tick_interval: Duration,
    pub settle_timeout: Duration,
}

#[derive(Clone, Debug, Serialize)]
pub struct LodShown {
    pub lod: u32,
    pub shown: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub seed: i32,
    pub ticks: u32,
    pub viewer_x: f32,
    pub chunks: usize,
    pub visible: usize,
    pub colliders: usize,
    pub height_jobs: usize,
    pub mesh_jobs: usize,
    pub lost_jobs: usize,
    /// False when outstanding jobs did not finish within the settle timeout.
    pub settled: bool,
    pub meshes: Vec<LodShown>,
}

/// Render stand-in that logs and counts what it is given.
#[derive(Default)]
pub struct LogSink {
    meshes_by_lod: HashMap<u32, usize>,
    colliders: usize,
}

impl TerrainSink for LogSink {
    fn chunk_created(&mut self, coord: ChunkCoord, bounds: Bounds2) {
        log::debug!(
            target: "sink",
            "chunk ({}, {}) spans ({:.0}, {:.0})..({:.0}, {:.0})",
            coord.cx,
            coord.cy,
            bounds.min.x,
            bounds.min.y,
            bounds.max.x,
            bounds.max.y
        );
    }

    fn set_color_map(&mut self, coord: ChunkCoord, colors: &Arc<ColorMap>) {
        log::trace!(
            target: "sink",
            "colours ({}, {}) {}x{}",
            coord.cx,
            coord.cy,
            colors.width,
            colors.height
        );
    }

    fn set_mesh(&mut self, coord: ChunkCoord, mesh: &Arc<TerrainMesh>) {
        *self.meshes_by_lod.entry(mesh.lod).or_insert(0) += 1;
        log::debug!(
            target: "sink",
            "mesh ({}, {}) lod {}: {} vertices, {} triangles",
            coord.cx,
            coord.cy,
            mesh.lod,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
    }

    fn set_collider(&mut self, coord: ChunkCoord, mesh: &Arc<TerrainMesh>) {
        self.colliders += 1;
        log::debug!(target: "sink", "collider ({}, {}) lod {}", coord.cx, coord.cy, mesh.lod);
    }

    fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
        log::trace!(target: "sink", "visible ({}, {}) = {visible}", coord.cx, coord.cy);
    }
}

/// Moves a viewer along +X for `opts.ticks` ticks, then lets outstanding work finish.
pub fn run(params: &TerrainParams, opts: &SessionOptions) -> Result<SessionSummary, Box<dyn Error>> {
    let scheduler = Scheduler::new(SchedulerParams::from_terrain(params))?;
    log::info!(
        target: "session",
        "seed {}, {} workers, chunk {} units, view {} units",
        params.noise.seed,
        scheduler.workers,
        params.chunk_world_size(),
        params.max_view_distance()
    );
    let mut streamer = ChunkStreamer::new(
        StreamParams::from_terrain(params),
        scheduler,
        LogSink::default(),
    );

    let step = Vec2::new(opts.speed, 0.0);
    let mut pos = Vec2::ZERO;
    let mut last = pos;
    for _ in 0..opts.ticks {
        streamer.tick(pos);
        last = pos;
        pos = pos + step;
        if !opts.tick_interval.is_zero() {
            thread::sleep(opts.tick_interval);
        }
    }

    let deadline = Instant::now() + opts.settle_timeout;
    let mut settled = false;
    loop {
        streamer.tick(last);
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !streamer.scheduler().wait_idle(remaining) {
            log::warn!(target: "session", "outstanding jobs after {:?}", opts.settle_timeout);
            break;
        }
        if streamer.scheduler().pending_results() == 0 {
            settled = true;
            break;
        }
    }

    let stats = streamer.scheduler().stats();
    let sink = streamer.sink();
    let mut meshes: Vec<LodShown> = sink
        .meshes_by_lod
        .iter()
        .map(|(&lod, &shown)| LodShown { lod, shown })
        .collect();
    meshes.sort_by_key(|m| m.lod);

    Ok(SessionSummary {
        seed: params.noise.seed,
        ticks: opts.ticks,
        viewer_x: last.x,
        chunks: streamer.chunk_count(),
        visible: streamer.visible_chunks().len(),
        colliders: sink.colliders,
        height_jobs: stats.height_submitted,
        mesh_jobs: stats.mesh_submitted,
        lost_jobs: stats.lost,
        settled,
        meshes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_world::LodInfo;

    #[test]
    fn short_session_settles_and_reports() {
        let mut params = TerrainParams::default();
        params.edge = 31;
        params.world_scale = 1.0;
        params.lods = vec![LodInfo::new(0, 10.0, true), LodInfo::new(2, 45.0, false)];
        params.worker_threads = 2;
        let opts = SessionOptions {
            ticks: 5,
            speed: 10.0,
            tick_interval: Duration::ZERO,
            settle_timeout: Duration::from_secs(60),
        };
        let summary = run(&params, &opts).expect("session");
        assert!(summary.settled);
        assert_eq!(summary.lost_jobs, 0);
        assert_eq!(summary.viewer_x, 40.0);
        assert!(summary.chunks >= 25);
        assert!(summary.visible > 0);
        assert!(summary.colliders >= 1);
        assert_eq!(summary.height_jobs, summary.chunks);
        let report = toml::to_string_pretty(&summary).expect("toml");
        assert!(report.contains("[[meshes]]"));
    }
}
