use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use loam_world::{ConfigError, TerrainConfig, TerrainParams, load_config_from_path};

use crate::session::SessionOptions;

/// Streams procedural terrain around a viewer moving along +X, without rendering.
#[derive(Debug, Parser)]
#[command(name = "loam", version)]
pub struct Args {
    /// Terrain config (TOML). Built-in defaults when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of viewer updates to run.
    #[arg(long, default_value_t = 120)]
    pub ticks: u32,

    /// Viewer travel per tick, in world units.
    #[arg(long, default_value_t = 12.0)]
    pub speed: f32,

    /// Pause between ticks, in milliseconds.
    #[arg(long, default_value_t = 16)]
    pub tick_ms: u64,

    /// Overrides `noise.seed` from the config.
    #[arg(long)]
    pub seed: Option<i32>,

    /// Log filter, e.g. `debug` or `stream=trace`. Falls back to RUST_LOG, then `info`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write a TOML run summary here.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// How long to wait for outstanding jobs after the last tick, in seconds.
    #[arg(long, default_value_t = 120)]
    pub settle_secs: u64,
}

impl Args {
    pub fn load_params(&self) -> Result<TerrainParams, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => load_config_from_path(path)?,
            None => TerrainConfig::default(),
        };
        if let Some(seed) = self.seed {
            cfg.noise.seed = seed;
        }
        cfg.validate()?;
        Ok(TerrainParams::from_config(&cfg))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            ticks: self.ticks,
            speed: self.speed,
            tick_interval: Duration::from_millis(self.tick_ms),
            settle_timeout: Duration::from_secs(self.settle_secs),
        }
    }
}
