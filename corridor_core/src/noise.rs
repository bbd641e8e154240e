//! Deterministic hash-based value noise.

use bevy::math::DVec2;

use crate::config::EdgeJitterConfig;

/// Fractal sum of value noise in `[0, 1]`.
pub fn fbm_noise(p: DVec2, octaves: u32, lacunarity: f64, gain: f64, seed: u32) -> f64 {
    let mut frequency = 1.0;
    let mut amplitude = 1.0;
    let mut sum = 0.0;
    let mut normaliser = 0.0;
    for i in 0..octaves.max(1) {
        let s = seed.wrapping_add(i);
        sum += value_noise(p * frequency, s) * amplitude;
        normaliser += amplitude;
        frequency *= lacunarity;
        amplitude *= gain;
    }
    (sum / normaliser).clamp(0.0, 1.0)
}

pub fn value_noise(p: DVec2, seed: u32) -> f64 {
    let x0 = p.x.floor() as i32;
    let y0 = p.y.floor() as i32;
    let xf = p.x - x0 as f64;
    let yf = p.y - y0 as f64;

    let v00 = hash2(x0, y0, seed);
    let v10 = hash2(x0.wrapping_add(1), y0, seed);
    let v01 = hash2(x0, y0.wrapping_add(1), seed);
    let v11 = hash2(x0.wrapping_add(1), y0.wrapping_add(1), seed);

    let sx = smoothstep(xf);
    let i1 = lerp(v00, v10, sx);
    let i2 = lerp(v01, v11, sx);
    lerp(i1, i2, smoothstep(yf))
}

/// Cubic Hermite `3t² − 2t³` on `t` clamped to `[0, 1]`.
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn hash2(x: i32, y: i32, seed: u32) -> f64 {
    let mut n = x as u32;
    n = n.wrapping_mul(0x6C8E_9CF5) ^ (y as u32).wrapping_mul(0xB529_7A4D) ^ seed;
    n ^= n >> 13;
    n = n.wrapping_mul(0x1B56_C4E9);
    n ^= n >> 11;
    ((n >> 8) & 0xFFFF) as f64 / 65535.0
}

pub fn mix_seed(base: u32, seed: u64, salt: u32) -> u32 {
    let seed_low = seed as u32;
    let seed_high = (seed >> 32) as u32;
    base ^ seed_low.rotate_left(7) ^ seed_high.rotate_left(11) ^ salt
}

/// Half-width perturbation derived from world position.
#[derive(Debug, Clone, Copy)]
pub struct EdgeJitter {
    amplitude: f64,
    frequency: f64,
    octaves: u32,
    seed: u32,
}

impl EdgeJitter {
    /// `None` when jitter is disabled or has no amplitude.
    pub fn from_config(config: &EdgeJitterConfig) -> Option<Self> {
        if !config.enabled || config.amplitude_meters <= 0.0 {
            return None;
        }
        Some(Self {
            amplitude: config.amplitude_meters,
            frequency: config.frequency.max(0.0),
            octaves: config.octaves.max(1),
            seed: mix_seed(0xED6E_0001, config.seed, 0x51A7),
        })
    }

    /// Offset in meters, bounded by `±amplitude`.
    pub fn offset(&self, world_xz: DVec2) -> f64 {
        let n = fbm_noise(world_xz * self.frequency, self.octaves, 2.0, 0.5, self.seed);
        (n * 2.0 - 1.0) * self.amplitude
    }
}
