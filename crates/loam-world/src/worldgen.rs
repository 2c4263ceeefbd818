use loam_mesh::{HeightCurve, lod_stride};
use loam_noise::{NoiseSettings, NormalizeMode, Region, RegionTable, Rgba};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("LOD table is empty")]
    EmptyLodTable,

    #[error("LOD entry {index}: visible distance {value} must be finite and positive")]
    InvalidLodThreshold { index: usize, value: f32 },

    #[error("LOD entry {index}: visible distance must be greater than the previous entry")]
    LodThresholdsNotAscending { index: usize },

    #[error("LOD entry {index}: level must be greater than the previous entry")]
    LodLevelsNotAscending { index: usize },

    #[error("more than one LOD entry is marked use_for_collider")]
    MultipleColliderLods,

    #[error("LOD {lod}: stride {stride} does not divide the sampled span {span}")]
    LodStrideMismatch { lod: u32, stride: usize, span: usize },

    #[error("region table is empty")]
    EmptyRegionTable,

    #[error("region {index}: threshold {value} is outside [0, 1]")]
    RegionThresholdOutOfRange { index: usize, value: f32 },

    #[error("region {index}: threshold is below the previous region")]
    RegionsNotAscending { index: usize },

    #[error("chunk resolution {0} is too small (minimum 2)")]
    ChunkTooSmall(usize),

    #[error("octaves must be at least 1")]
    InvalidOctaves,

    #[error("lacunarity {0} must be at least 1")]
    InvalidLacunarity(f32),

    #[error("persistence {0} must be in (0, 1]")]
    InvalidPersistence(f32),

    #[error("viewer move threshold {0} must be positive")]
    InvalidMoveThreshold(f32),

    #[error("world scale {0} must be positive")]
    InvalidWorldScale(f32),

    #[error("height curve keys are not sorted by input")]
    CurveNotSorted,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default)]
    pub chunk: Chunk,
    #[serde(default)]
    pub noise: Noise,
    #[serde(default)]
    pub height: Height,
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,
    #[serde(default = "default_lods")]
    pub lods: Vec<LodInfo>,
    #[serde(default)]
    pub workers: Workers,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk: Chunk::default(),
            noise: Noise::default(),
            height: Height::default(),
            regions: default_regions(),
            lods: default_lods(),
            workers: Workers::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chunk {
    /// Interior samples per chunk edge; the sampled heightmap carries one extra rim sample per side.
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    /// World units per mesh unit; viewer positions are divided by this.
    #[serde(default = "default_world_scale")]
    pub world_scale: f32,
    #[serde(default = "default_move_threshold")]
    pub move_threshold: f32,
}
fn default_resolution() -> usize {
    239
}
fn default_world_scale() -> f32 {
    2.0
}
fn default_move_threshold() -> f32 {
    25.0
}
impl Default for Chunk {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            world_scale: default_world_scale(),
            move_threshold: default_move_threshold(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Noise {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f32,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default)]
    pub normalize_mode: NormalizeMode,
    #[serde(default)]
    pub use_falloff: bool,
}
fn default_seed() -> i32 {
    1
}
fn default_scale() -> f32 {
    50.0
}
fn default_octaves() -> u32 {
    4
}
fn default_persistence() -> f32 {
    0.5
}
fn default_lacunarity() -> f32 {
    2.0
}
impl Default for Noise {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            scale: default_scale(),
            octaves: default_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            offset: [0.0, 0.0],
            normalize_mode: NormalizeMode::Global,
            use_falloff: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Height {
    #[serde(default = "default_multiplier")]
    pub multiplier: f32,
    /// `[input, output]` keys; empty means identity.
    #[serde(default)]
    pub curve: Vec<[f32; 2]>,
}
fn default_multiplier() -> f32 {
    30.0
}
impl Height {
    pub fn to_curve(&self) -> HeightCurve {
        HeightCurve::from_keys(self.curve.iter().map(|k| (k[0], k[1])).collect())
    }
}
impl Default for Height {
    fn default() -> Self {
        Self {
            multiplier: default_multiplier(),
            curve: Vec::new(),
        }
    }
}

/// One row of the distance to LOD table.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LodInfo {
    pub lod: u32,
    /// Nearest-edge distance up to which this LOD is shown.
    pub visible_distance: f32,
    #[serde(default)]
    pub use_for_collider: bool,
}

impl LodInfo {
    pub const fn new(lod: u32, visible_distance: f32, use_for_collider: bool) -> Self {
        Self {
            lod,
            visible_distance,
            use_for_collider,
        }
    }
}

fn default_lods() -> Vec<LodInfo> {
    vec![
        LodInfo::new(0, 200.0, true),
        LodInfo::new(1, 400.0, false),
        LodInfo::new(4, 600.0, false),
    ]
}

fn default_regions() -> Vec<Region> {
    let region = |name: &str, threshold: f32, color: [u8; 4]| Region {
        name: name.to_string(),
        threshold,
        color: Rgba(color),
    };
    vec![
        region("deep_water", 0.0, [50, 99, 195, 255]),
        region("shallow_water", 0.3, [54, 103, 199, 255]),
        region("sand", 0.4, [210, 208, 125, 255]),
        region("grass", 0.45, [86, 152, 23, 255]),
        region("forest", 0.55, [62, 107, 18, 255]),
        region("rock", 0.6, [90, 69, 60, 255]),
        region("high_rock", 0.7, [75, 60, 53, 255]),
        region("snow", 0.9, [255, 255, 255, 255]),
    ]
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Workers {
    /// Worker threads; 0 lets the pool pick one per core.
    #[serde(default)]
    pub threads: usize,
}

impl TerrainConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Checks every structural rule the streamer and mesher rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_chunk()?;
        self.validate_noise()?;
        self.validate_lods()?;
        self.validate_regions()?;
        if !self.height.to_curve().is_sorted() {
            return Err(ConfigError::CurveNotSorted);
        }
        Ok(())
    }

    fn validate_chunk(&self) -> Result<(), ConfigError> {
        let c = &self.chunk;
        if c.resolution < 2 {
            return Err(ConfigError::ChunkTooSmall(c.resolution));
        }
        if !(c.world_scale > 0.0 && c.world_scale.is_finite()) {
            return Err(ConfigError::InvalidWorldScale(c.world_scale));
        }
        if !(c.move_threshold > 0.0 && c.move_threshold.is_finite()) {
            return Err(ConfigError::InvalidMoveThreshold(c.move_threshold));
        }
        Ok(())
    }

    fn validate_noise(&self) -> Result<(), ConfigError> {
        let n = &self.noise;
        if n.octaves < 1 {
            return Err(ConfigError::InvalidOctaves);
        }
        if !(n.lacunarity >= 1.0 && n.lacunarity.is_finite()) {
            return Err(ConfigError::InvalidLacunarity(n.lacunarity));
        }
        if !(n.persistence > 0.0 && n.persistence <= 1.0) {
            return Err(ConfigError::InvalidPersistence(n.persistence));
        }
        Ok(())
    }

    fn validate_lods(&self) -> Result<(), ConfigError> {
        if self.lods.is_empty() {
            return Err(ConfigError::EmptyLodTable);
        }
        let span = self.chunk.resolution + 1;
        let mut colliders = 0;
        for (index, info) in self.lods.iter().enumerate() {
            let value = info.visible_distance;
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidLodThreshold { index, value });
            }
            if index > 0 {
                let prev = &self.lods[index - 1];
                if value <= prev.visible_distance {
                    return Err(ConfigError::LodThresholdsNotAscending { index });
                }
                if info.lod <= prev.lod {
                    return Err(ConfigError::LodLevelsNotAscending { index });
                }
            }
            let stride = lod_stride(info.lod);
            if span % stride != 0 {
                return Err(ConfigError::LodStrideMismatch {
                    lod: info.lod,
                    stride,
                    span,
                });
            }
            if info.use_for_collider {
                colliders += 1;
            }
        }
        if colliders > 1 {
            return Err(ConfigError::MultipleColliderLods);
        }
        Ok(())
    }

    fn validate_regions(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::EmptyRegionTable);
        }
        for (index, region) in self.regions.iter().enumerate() {
            let value = region.threshold;
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RegionThresholdOutOfRange { index, value });
            }
            if index > 0 && value < self.regions[index - 1].threshold {
                return Err(ConfigError::RegionsNotAscending { index });
            }
        }
        Ok(())
    }
}

/// Flattened runtime view of a validated [`TerrainConfig`].
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub edge: usize,
    pub world_scale: f32,
    pub move_threshold: f32,
    pub noise: NoiseSettings,
    pub use_falloff: bool,
    pub height_multiplier: f32,
    pub curve: HeightCurve,
    pub regions: RegionTable,
    pub lods: Vec<LodInfo>,
    pub worker_threads: usize,
}

impl TerrainParams {
    pub fn from_config(cfg: &TerrainConfig) -> Self {
        let n = &cfg.noise;
        Self {
            edge: cfg.chunk.resolution,
            world_scale: cfg.chunk.world_scale,
            move_threshold: cfg.chunk.move_threshold,
            noise: NoiseSettings {
                seed: n.seed,
                scale: n.scale,
                octaves: n.octaves,
                persistence: n.persistence,
                lacunarity: n.lacunarity,
                offset: n.offset,
                normalize_mode: n.normalize_mode,
            },
            use_falloff: n.use_falloff,
            height_multiplier: cfg.height.multiplier,
            curve: cfg.height.to_curve(),
            regions: RegionTable::new(cfg.regions.clone()),
            lods: cfg.lods.clone(),
            worker_threads: cfg.workers.threads,
        }
    }

    /// Samples per side of the heightmap a chunk is built from.
    #[inline]
    pub fn bordered_size(&self) -> usize {
        self.edge + 2
    }

    /// World extent of one chunk along each horizontal axis, in mesh units.
    #[inline]
    pub fn chunk_world_size(&self) -> f32 {
        (self.edge - 1) as f32
    }

    /// Largest LOD threshold, beyond which chunks are hidden.
    pub fn max_view_distance(&self) -> f32 {
        self.lods.last().map_or(0.0, |l| l.visible_distance)
    }

    pub fn collider_lod_index(&self) -> Option<usize> {
        self.lods.iter().position(|l| l.use_for_collider)
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_config(&TerrainConfig::default())
    }
}

/// Reads, parses and validates a terrain config file.
pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg = TerrainConfig::from_toml_str(&s)?;
    cfg.validate()?;
    log::info!(
        target: "config",
        "loaded {} (seed {}, {} LODs, {} regions)",
        path.display(),
        cfg.noise.seed,
        cfg.lods.len(),
        cfg.regions.len()
    );
    Ok(cfg)
}

pub fn load_params_from_path(path: &Path) -> Result<TerrainParams, ConfigError> {
    load_config_from_path(path).map(|cfg| TerrainParams::from_config(&cfg))
}
