//! Seeded synthetic terrain for demos, benches and scenario tests.

use bevy::math::DVec2;
use serde::Deserialize;

use crate::grid::HeightGrid;
use crate::mapper::GridMetadata;
use crate::noise::{fbm_noise, mix_seed};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub seed: u64,
    /// Broad landmass frequency, roughly `0.1..=1.5`.
    pub continent_scale: f64,
    /// Ridge frequency and weight, roughly `0.2..=2.5`.
    pub ridge_scale: f64,
    /// How strongly heights fall away from the grid centre.
    pub dome_strength: f64,
    /// Linear drop along +x, as a fraction of the vertical range.
    pub tilt: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            continent_scale: 0.6,
            ridge_scale: 0.6,
            dome_strength: 0.25,
            tilt: 0.0,
        }
    }
}

/// Continent fBm plus ridged detail, pulled down towards the edges and
/// normalised to `[0, 1]`.
pub fn build_terrain(metadata: GridMetadata, settings: &TerrainSettings) -> HeightGrid {
    let res = metadata.resolution;
    let continent_freq = 2.0 + settings.continent_scale.clamp(0.1, 1.5) * 6.0;
    let ridge_freq = 6.0 + settings.ridge_scale.clamp(0.2, 2.5) * 16.0;
    let continent_seed = mix_seed(0x9E37_0001, settings.seed, 0);
    let ridge_seed = mix_seed(0xC0F3_0001, settings.seed, 0x85EB);
    let denom = (res - 1).max(1) as f64;

    let mut raw = Vec::with_capacity(metadata.cell_count());
    for z in 0..res {
        for x in 0..res {
            let n = DVec2::new(x as f64 / denom, z as f64 / denom);

            let continent = fbm_noise(n * continent_freq, 4, 2.0, 0.5, continent_seed);
            let ridge_source = fbm_noise(n * ridge_freq, 3, 2.1, 0.45, ridge_seed);
            let ridged = (1.0 - (ridge_source - 0.5).abs() * 2.0)
                .clamp(0.0, 1.0)
                .powf(1.6);

            let mut height = continent * 0.75 + ridged * (0.2 + settings.ridge_scale * 0.25);
            let radial = (n - DVec2::splat(0.5)).length();
            height -= radial.powf(1.8) * settings.dome_strength;
            height -= n.x * settings.tilt;
            raw.push(height as f32);
        }
    }

    normalise(&mut raw);
    HeightGrid::from_fn(metadata, |x, z| raw[z * res + x])
}

/// Rescales raw heights onto `[0, 1]`.
fn normalise(values: &mut [f32]) {
    let (min_v, max_v) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let scale = if (max_v - min_v).abs() < f32::EPSILON {
        1.0
    } else {
        1.0 / (max_v - min_v)
    };
    for v in values {
        *v = ((*v - min_v) * scale).clamp(0.0, 1.0);
    }
}
