use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

/// Scales at or below zero are replaced by this to keep the sample divide finite.
pub const MIN_SCALE: f32 = 0.001;

/// Range each octave offset is drawn from before the caller offset is applied.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Global mode divides by `max_possible / GLOBAL_HEADROOM`, leaving room for
/// sums that rarely approach the analytic maximum.
const GLOBAL_HEADROOM: f32 = 0.9;

// Base kernel is fixed; per-seed variation comes from the octave offsets.
const KERNEL_SEED: i32 = 0;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Remap the observed min/max of this call to `[0, 1]`. Single-shot previews only.
    Local,
    /// Shared analytic curve; required for tiled terrain.
    #[default]
    Global,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseSettings {
    pub seed: i32,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: [f32; 2],
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 1,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
            normalize_mode: NormalizeMode::Global,
        }
    }
}

/// Row-major grid of normalized heights. `get(x, y)` addresses column `x`, row `y`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeightMap {
    /// Builds a map from row-major values; the vector is resized to `width * height`.
    pub fn from_values(width: usize, height: usize, mut values: Vec<f32>) -> Self {
        values.resize(width * height, 0.0);
        Self {
            width,
            height,
            values,
        }
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self::from_values(width, height, vec![value; width * height])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[self.idx(x, y)]
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns a new map with `f(x, y, h)` applied to every sample.
    pub fn map(&self, mut f: impl FnMut(usize, usize, f32) -> f32) -> HeightMap {
        let mut values = Vec::with_capacity(self.values.len());
        for y in 0..self.height {
            for x in 0..self.width {
                values.push(f(x, y, self.get(x, y)));
            }
        }
        HeightMap::from_values(self.width, self.height, values)
    }
}

/// Sum of octave amplitudes, the largest magnitude the raw sum can reach.
pub fn max_possible_height(octaves: u32, persistence: f32) -> f32 {
    let mut amplitude = 1.0_f32;
    let mut total = 0.0_f32;
    for _ in 0..octaves {
        total += amplitude;
        amplitude *= persistence;
    }
    total
}

fn octave_offsets(settings: &NoiseSettings, offset: [f32; 2]) -> Vec<(f32, f32)> {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed as i64 as u64);
    (0..settings.octaves)
        .map(|_| {
            let ox = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + offset[0];
            let oy = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 - offset[1];
            (ox, oy)
        })
        .collect()
}

fn base_kernel() -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(KERNEL_SEED);
    noise.set_noise_type(Some(NoiseType::Perlin));
    noise.set_frequency(Some(1.0));
    noise
}

/// Octave-summed noise over a `width × height` grid sampled around `offset`.
///
/// `offset` is the chunk's world position plus any global noise offset; adjacent
/// chunks therefore read one continuous noise domain. `settings.offset` is not
/// applied here so callers decide how to combine it.
pub fn generate_height_map(
    width: usize,
    height: usize,
    settings: &NoiseSettings,
    offset: [f32; 2],
) -> HeightMap {
    let kernel = base_kernel();
    let offsets = octave_offsets(settings, offset);
    let scale = if settings.scale <= 0.0 {
        MIN_SCALE
    } else {
        settings.scale
    };

    let half_width = width as f32 / 2.0;
    let half_height = height as f32 / 2.0;

    let mut raw = Vec::with_capacity(width * height);
    let mut min_raw = f32::MAX;
    let mut max_raw = f32::MIN;
    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0_f32;
            let mut frequency = 1.0_f32;
            let mut sum = 0.0_f32;
            for &(ox, oy) in &offsets {
                let sx = (x as f32 - half_width + ox) / scale * frequency;
                let sy = (y as f32 - half_height + oy) / scale * frequency;
                let base = kernel.get_noise_2d(sx, sy) * 0.5 + 0.5;
                sum += (base * 2.0 - 1.0) * amplitude;
                amplitude *= settings.persistence;
                frequency *= settings.lacunarity;
            }
            min_raw = min_raw.min(sum);
            max_raw = max_raw.max(sum);
            raw.push(sum);
        }
    }

    match settings.normalize_mode {
        NormalizeMode::Local => {
            let span = max_raw - min_raw;
            for v in &mut raw {
                *v = if span > 0.0 {
                    ((*v - min_raw) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
            }
        }
        NormalizeMode::Global => {
            let max_possible = max_possible_height(settings.octaves, settings.persistence);
            let denom = (max_possible / GLOBAL_HEADROOM).max(f32::EPSILON);
            for v in &mut raw {
                *v = ((*v + 1.0) / denom).clamp(0.0, 1.0);
            }
        }
    }

    HeightMap::from_values(width, height, raw)
}
