//! Configuration for corridor edits.
//!
//! Loaded from `corridor_config.json` with support for an environment variable
//! override. Every operation receives the config by reference; nothing here is
//! global or mutable once loaded.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::error::{CorridorError, CorridorResult};
use crate::profile::ProfileCurve;
use crate::transform::BlendFlags;

pub const BUILTIN_CORRIDOR_CONFIG: &str = include_str!("data/corridor_config.json");

pub const CORRIDOR_CONFIG_ENV: &str = "CORRIDOR_CONFIG_PATH";

/// Largest number of mask blur passes accepted.
pub const MAX_MASK_BLUR_ITERATIONS: u32 = 4;

/// Smallest accepted curve sample count.
pub const MIN_SAMPLES_ALONG: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub corridor: CorridorShapeConfig,
    pub carve: CarveConfig,
    pub sampling: SamplingConfig,
    pub trace: TraceConfig,
    pub blend: BlendConfig,
    pub smooth: SmoothConfig,
    pub write_back: WriteBackConfig,
}

impl CorridorConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_CORRIDOR_CONFIG)
                .expect("builtin corridor config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, CorridorConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| CorridorConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = CorridorConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Rejects option values no edit can run with.
    pub fn validate(&self) -> CorridorResult<()> {
        let shape = &self.corridor;
        require(
            shape.half_width_meters > 0.0,
            "corridor.half_width_meters must be positive",
        )?;
        require(
            shape.falloff_meters >= 0.0,
            "corridor.falloff_meters must not be negative",
        )?;
        require(
            shape.box_padding_meters >= 0.0,
            "corridor.box_padding_meters must not be negative",
        )?;
        require(
            (0.0..=1.0).contains(&shape.edge_softness),
            "corridor.edge_softness must be within [0, 1]",
        )?;
        require(
            shape.min_half_width_meters > 0.0,
            "corridor.min_half_width_meters must be positive",
        )?;
        require(
            shape.start_fade_meters >= 0.0 && shape.end_fade_meters >= 0.0,
            "corridor fade distances must not be negative",
        )?;
        require(
            shape.mask_blur_iterations <= MAX_MASK_BLUR_ITERATIONS,
            "corridor.mask_blur_iterations must be at most 4",
        )?;
        require(
            self.carve.max_depth_meters >= 0.0,
            "carve.max_depth_meters must not be negative",
        )?;
        require(
            self.sampling.samples_along >= MIN_SAMPLES_ALONG,
            "sampling.samples_along must be at least 8",
        )?;
        require(
            self.sampling.spacing_factor > 0.0 && self.sampling.spacing_factor <= 1.0,
            "sampling.spacing_factor must be within (0, 1]",
        )?;
        require(
            self.trace.step_size_meters > 0.0,
            "trace.step_size_meters must be positive",
        )?;
        require(
            self.trace.low_slope_hysteresis >= 1,
            "trace.low_slope_hysteresis must be at least 1",
        )?;
        require(
            self.trace.edge_padding_meters >= 0.0,
            "trace.edge_padding_meters must not be negative",
        )?;
        require(
            self.trace.smooth_window_meters >= 0.0,
            "trace.smooth_window_meters must not be negative",
        )?;
        require(
            self.blend.delta_scale >= 0.0,
            "blend.delta_scale must not be negative",
        )?;
        Ok(())
    }
}

fn require(condition: bool, message: &str) -> CorridorResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CorridorError::configuration(message))
    }
}

/// Corridor cross-section and mask shaping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorridorShapeConfig {
    pub half_width_meters: f64,
    pub falloff_meters: f64,
    /// Extra margin around each stamp's bounding box.
    pub box_padding_meters: f64,
    /// 0 gives a linear carve cross-section, 1 a smoothstep one.
    pub edge_softness: f64,
    pub min_half_width_meters: f64,
    pub width_profile: ProfileCurve,
    pub edge_jitter: EdgeJitterConfig,
    pub start_fade_meters: f64,
    pub end_fade_meters: f64,
    pub mask_blur_iterations: u32,
}

impl Default for CorridorShapeConfig {
    fn default() -> Self {
        Self {
            half_width_meters: 4.0,
            falloff_meters: 3.0,
            box_padding_meters: 1.0,
            edge_softness: 0.5,
            min_half_width_meters: 0.25,
            width_profile: ProfileCurve::default(),
            edge_jitter: EdgeJitterConfig::default(),
            start_fade_meters: 0.0,
            end_fade_meters: 0.0,
            mask_blur_iterations: 0,
        }
    }
}

impl CorridorShapeConfig {
    /// Lower bound on the half width at any sample, after profile and jitter.
    pub fn narrowest_half_width(&self) -> f64 {
        let mut half_width = self.half_width_meters * self.width_profile.min_value();
        if self.edge_jitter.enabled {
            half_width -= self.edge_jitter.amplitude_meters.max(0.0);
        }
        half_width.max(self.min_half_width_meters)
    }
}

/// Noise applied to the half width as a function of world position.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeJitterConfig {
    pub enabled: bool,
    pub amplitude_meters: f64,
    /// Noise cycles per world meter.
    pub frequency: f64,
    pub octaves: u32,
    pub seed: u64,
}

impl Default for EdgeJitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            amplitude_meters: 0.5,
            frequency: 0.05,
            octaves: 3,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CarveConfig {
    pub max_depth_meters: f64,
    pub depth_profile: ProfileCurve,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            max_depth_meters: 2.0,
            depth_profile: ProfileCurve::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Evenly spaced samples taken along curve-backed centerlines.
    pub samples_along: usize,
    /// Traced paths are sampled every `half_width * spacing_factor` meters.
    pub spacing_factor: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples_along: 64,
            spacing_factor: 0.5,
        }
    }
}

/// Steepest-descent tracing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub step_size_meters: f64,
    pub max_steps: usize,
    pub min_slope: f64,
    pub low_slope_hysteresis: usize,
    pub edge_padding_meters: f64,
    pub max_length_meters: Option<f64>,
    /// World height at or below which tracing stops.
    pub stop_height_meters: Option<f64>,
    pub smooth_window_meters: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            step_size_meters: 1.0,
            max_steps: 2048,
            min_slope: 0.01,
            low_slope_hysteresis: 8,
            edge_padding_meters: 1.0,
            max_length_meters: None,
            stop_height_meters: None,
            smooth_window_meters: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub only_lower: bool,
    pub negative_delta_only: bool,
    pub delta_scale: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            only_lower: false,
            negative_delta_only: false,
            delta_scale: 1.0,
        }
    }
}

impl BlendConfig {
    pub fn flags(&self) -> BlendFlags {
        let mut flags = BlendFlags::empty();
        flags.set(BlendFlags::ONLY_LOWER, self.only_lower);
        flags.set(BlendFlags::NEGATIVE_DELTA_ONLY, self.negative_delta_only);
        flags
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmoothConfig {
    pub radius: usize,
    pub passes: usize,
    /// Forces the whole grid's border cells to zero after smoothing.
    pub zero_grid_edges: bool,
    pub confine_to_region: bool,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            passes: 1,
            zero_grid_edges: false,
            confine_to_region: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WriteBackConfig {
    pub apply_full: bool,
}

#[derive(Debug, Error)]
pub enum CorridorConfigError {
    #[error("failed to parse corridor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read corridor config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Shared handle to an immutable corridor configuration, insertable into ECS hosts.
#[derive(Resource, Debug, Clone)]
pub struct CorridorConfigHandle(pub Arc<CorridorConfig>);

impl CorridorConfigHandle {
    pub fn new(config: Arc<CorridorConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<CorridorConfig> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, config: Arc<CorridorConfig>) {
        self.0 = config;
    }
}

/// Where the active corridor configuration came from.
#[derive(Resource, Debug, Clone)]
pub struct CorridorConfigMetadata {
    path: Option<PathBuf>,
}

impl CorridorConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load corridor configuration from `CORRIDOR_CONFIG_PATH` or the default path,
/// falling back to the builtin copy.
pub fn load_corridor_config_from_env() -> (Arc<CorridorConfig>, CorridorConfigMetadata) {
    let override_path = env::var(CORRIDOR_CONFIG_ENV).ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/corridor_config.json");

    let path = override_path.unwrap_or(default_path);
    match CorridorConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "corridor::config",
                path = %path.display(),
                "corridor_config.loaded=file"
            );
            return (Arc::new(config), CorridorConfigMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "corridor::config",
                path = %path.display(),
                error = %err,
                "corridor_config.load_failed"
            );
        }
    }

    let config = CorridorConfig::builtin();
    tracing::info!(target: "corridor::config", "corridor_config.loaded=builtin");
    (config, CorridorConfigMetadata::new(None))
}
