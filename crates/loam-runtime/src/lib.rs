//! Background terrain generation: worker pool, completion queue, single drain point.
#![forbid(unsafe_code)]

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use loam_mesh::{HeightCurve, TerrainMesh, build_terrain_mesh};
use loam_noise::{
    ColorMap, HeightMap, NoiseSettings, RegionTable, apply_falloff, generate_falloff_map,
    generate_height_map,
};
use loam_world::{ChunkCoord, TerrainParams};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Everything a worker needs to turn a request into a result.
#[derive(Clone, Debug)]
pub struct SchedulerParams {
    pub edge: usize,
    pub noise: NoiseSettings,
    pub use_falloff: bool,
    pub regions: RegionTable,
    pub height_multiplier: f32,
    pub curve: HeightCurve,
    /// 0 picks one worker per available core.
    pub worker_threads: usize,
}

impl SchedulerParams {
    pub fn from_terrain(p: &TerrainParams) -> Self {
        Self {
            edge: p.edge,
            noise: p.noise.clone(),
            use_falloff: p.use_falloff,
            regions: p.regions.clone(),
            height_multiplier: p.height_multiplier,
            curve: p.curve.clone(),
            worker_threads: p.worker_threads,
        }
    }
}

/// Heightmap of one chunk plus its interior colour classification.
#[derive(Clone, Debug)]
pub struct HeightData {
    pub height_map: Arc<HeightMap>,
    pub color_map: Arc<ColorMap>,
}

#[derive(Clone, Debug)]
pub enum JobResult {
    Height(HeightData),
    Mesh { lod: u32, mesh: Arc<TerrainMesh> },
}

/// One finished job, tagged with the chunk that asked for it.
#[derive(Clone, Debug)]
pub struct Completed {
    pub coord: ChunkCoord,
    pub result: JobResult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Height,
    Mesh,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub height_submitted: usize,
    pub mesh_submitted: usize,
    /// Jobs whose result reached the completion queue.
    pub completed: usize,
    /// Results handed to the consumer by `drain`.
    pub drained: usize,
    /// Jobs that panicked; no result was queued for them.
    pub lost: usize,
    pub in_flight: usize,
}

type JobFn = Box<dyn FnOnce(&JobContext) -> JobResult + Send + 'static>;

struct Job {
    coord: ChunkCoord,
    kind: JobKind,
    run: JobFn,
}

/// Shared, immutable state every job runs against.
pub struct JobContext {
    params: SchedulerParams,
    falloff: Option<HeightMap>,
}

impl JobContext {
    #[inline]
    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Bordered heightmap and colours for the chunk centred at `center`.
    pub fn height(&self, center: [f32; 2]) -> HeightData {
        let bordered = self.params.edge + 2;
        let noise = &self.params.noise;
        let offset = [center[0] + noise.offset[0], center[1] + noise.offset[1]];
        let mut map = generate_height_map(bordered, bordered, noise, offset);
        if let Some(mask) = &self.falloff {
            map = apply_falloff(&map, mask);
        }
        let color_map = ColorMap::from_heights(&map, &self.params.regions);
        HeightData {
            height_map: Arc::new(map),
            color_map: Arc::new(color_map),
        }
    }

    pub fn mesh(&self, map: &HeightMap, lod: u32) -> TerrainMesh {
        build_terrain_mesh(map, self.params.height_multiplier, &self.params.curve, lod)
    }
}

#[derive(Default)]
struct Counters {
    height_submitted: AtomicUsize,
    mesh_submitted: AtomicUsize,
    completed: AtomicUsize,
    drained: AtomicUsize,
    lost: AtomicUsize,
    in_flight: AtomicUsize,
    idle_lock: Mutex<()>,
    idle: Condvar,
}

impl Counters {
    /// Marks one job finished and wakes `wait_idle` callers when none remain.
    fn finish_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.idle.notify_all();
        }
    }
}

fn run_job(job: Job, ctx: &JobContext, counters: &Counters, tx: &Sender<Completed>) {
    let Job { coord, kind, run } = job;
    match panic::catch_unwind(AssertUnwindSafe(|| run(ctx))) {
        Ok(result) => {
            counters.completed.fetch_add(1, Ordering::Relaxed);
            let _ = tx.send(Completed { coord, result });
        }
        Err(_) => {
            counters.lost.fetch_add(1, Ordering::Relaxed);
            log::error!(
                target: "scheduler",
                "{:?} job for ({}, {}) panicked; result dropped",
                kind,
                coord.cx,
                coord.cy
            );
        }
    }
    counters.finish_one();
}

/// Runs height and mesh jobs on a worker pool and queues their results.
///
/// Requests return immediately. Results are only handed out by [`Scheduler::drain`]
/// or [`Scheduler::drain_with`], on the caller's thread.
pub struct Scheduler {
    job_tx: Sender<Job>,
    res_rx: Receiver<Completed>,
    _pool: Arc<ThreadPool>,
    counters: Arc<Counters>,
    pub workers: usize,
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Result<Self, ThreadPoolBuildError> {
        let (job_tx, job_rx) = unbounded::<Job>();
        let (res_tx, res_rx) = unbounded::<Completed>();

        let workers = if params.worker_threads > 0 {
            params.worker_threads
        } else {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        };
        let falloff = params
            .use_falloff
            .then(|| generate_falloff_map(params.edge + 2));
        let shared = Arc::new(JobContext { params, falloff });
        let counters = Arc::new(Counters::default());

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("loam-gen-{i}"))
                .build()?,
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let shared = shared.clone();
            let counters = counters.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    run_job(job, shared.as_ref(), counters.as_ref(), &tx);
                }
            });
        }
        log::debug!(target: "scheduler", "started {workers} generation workers");

        Ok(Self {
            job_tx,
            res_rx,
            _pool: pool,
            counters,
            workers,
        })
    }

    /// Queues heightmap generation for the chunk centred at `center`.
    pub fn request_height(&self, coord: ChunkCoord, center: [f32; 2]) {
        log::trace!(target: "scheduler", "height request ({}, {})", coord.cx, coord.cy);
        self.spawn_job(coord, JobKind::Height, move |w| {
            JobResult::Height(w.height(center))
        });
    }

    /// Queues mesh construction of `map` at `lod`.
    pub fn request_mesh(&self, coord: ChunkCoord, map: Arc<HeightMap>, lod: u32) {
        log::trace!(target: "scheduler", "mesh request ({}, {}) lod {lod}", coord.cx, coord.cy);
        self.spawn_job(coord, JobKind::Mesh, move |w| JobResult::Mesh {
            lod,
            mesh: Arc::new(w.mesh(&map, lod)),
        });
    }

    /// Queues an arbitrary job whose result is delivered like any other.
    pub fn spawn_job<F>(&self, coord: ChunkCoord, kind: JobKind, f: F)
    where
        F: FnOnce(&JobContext) -> JobResult + Send + 'static,
    {
        let counter = match kind {
            JobKind::Height => &self.counters.height_submitted,
            JobKind::Mesh => &self.counters.mesh_submitted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.counters.in_flight.fetch_add(1, Ordering::Relaxed);
        let job = Job {
            coord,
            kind,
            run: Box::new(f),
        };
        if self.job_tx.send(job).is_err() {
            self.counters.lost.fetch_add(1, Ordering::Relaxed);
            self.counters.finish_one();
        }
    }

    /// Takes exactly the results queued when the call began.
    ///
    /// Anything finishing while the caller processes the returned batch waits for
    /// the next drain.
    pub fn drain(&self) -> Vec<Completed> {
        let n = self.res_rx.len();
        let out: Vec<Completed> = self.res_rx.try_iter().take(n).collect();
        if !out.is_empty() {
            self.counters.drained.fetch_add(out.len(), Ordering::Relaxed);
            log::trace!(target: "scheduler", "drained {} results", out.len());
        }
        out
    }

    /// Drains a snapshot and hands each result to `f`. Returns how many were handled.
    pub fn drain_with(&self, mut f: impl FnMut(Completed)) -> usize {
        let batch = self.drain();
        let n = batch.len();
        for c in batch {
            f(c);
        }
        n
    }

    pub fn pending_results(&self) -> usize {
        self.res_rx.len()
    }

    pub fn stats(&self) -> SchedulerStats {
        let c = &self.counters;
        SchedulerStats {
            height_submitted: c.height_submitted.load(Ordering::Relaxed),
            mesh_submitted: c.mesh_submitted.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            drained: c.drained.load(Ordering::Relaxed),
            lost: c.lost.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Acquire),
        }
    }

    /// Blocks until no job is running or queued, or `timeout` passes. True when idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let c = &self.counters;
        let deadline = Instant::now() + timeout;
        let mut guard = c.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while c.in_flight.load(Ordering::Acquire) != 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = c
                .idle
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}
