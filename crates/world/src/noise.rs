//! Noise generation utilities for terrain generation.
//!
//! Gradient noise built from four surflets per lattice cell, combined into a
//! hybrid multifractal. Every function here is pure: the same inputs always give
//! the same bits.

use blockfield_core::WorldSeed;
use glam::Vec2;

/// Number of octaves summed by [`HybridMultifractal`].
pub const OCTAVES: usize = 8;
/// Frequency multiplier between octaves.
pub const LACUNARITY: f32 = 10.0;
/// Constant added to each octave's ridge signal.
pub const OFFSET: f32 = 0.7;

/// `fract(x)` with the GLSL convention `x - floor(x)`.
#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Hermite smoothstep between `edge0` and `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Clamp `value` into `[min, max]` and renormalize it to `[0, 1]` with smoothstep.
#[inline]
pub fn remap(value: f32, min: f32, max: f32) -> f32 {
    smoothstep(min, max, value.clamp(min, max))
}

/// Quintic falloff weight for a lattice corner `distance` away.
///
/// `1 - smootherstep(distance)`: one at the corner, zero from distance one on.
#[inline]
pub fn falloff(distance: f32) -> f32 {
    let t = distance.clamp(0.0, 1.0);
    1.0 - t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Hash a lattice corner to a gradient with components in `[-1, 1)`.
///
/// The seed is accepted for signature symmetry but does not enter the hash;
/// seeding happens by offsetting the lookup coordinates.
#[inline]
pub fn pseudo_random_gradient(corner: Vec2, _seed: WorldSeed) -> Vec2 {
    let hashed = Vec2::new(
        corner.dot(Vec2::new(127.1, 311.7)).sin() * 43758.5453,
        corner.dot(Vec2::new(269.5, 183.3)).sin() * 43758.5453,
    );
    let unit = Vec2::new(fract(hashed.x), fract(hashed.y));
    unit * 2.0 - Vec2::ONE
}

/// Contribution of one lattice corner to the noise at `point`.
#[inline]
pub fn surflet(point: Vec2, corner: Vec2, seed: WorldSeed) -> f32 {
    let gradient = pseudo_random_gradient(corner, seed);
    let diff = point - corner;
    falloff(point.distance(corner)) * diff.dot(gradient)
}

/// 2D gradient noise: the sum of the four corner surflets of the containing cell.
pub fn gradient_noise_2d(x: f32, z: f32, seed: WorldSeed) -> f32 {
    let point = Vec2::new(x, z);
    let base = point.floor();
    let mut sum = 0.0;
    for i in 0..=1 {
        for j in 0..=1 {
            sum += surflet(point, base + Vec2::new(i as f32, j as f32), seed);
        }
    }
    sum
}

/// Fractal shape parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalConfig {
    /// Fractal increment: one is smooth, zero is rough.
    pub h: f32,
    /// World units per noise lattice cell at the first octave.
    pub scale: f32,
}

/// Hybrid multifractal with its per-octave exponents precomputed.
#[derive(Debug, Clone)]
pub struct HybridMultifractal {
    config: FractalConfig,
    exponents: [f32; OCTAVES],
}

impl HybridMultifractal {
    pub fn new(config: FractalConfig) -> Self {
        let mut exponents = [0.0; OCTAVES];
        let mut frequency: f32 = 1.0;
        for exponent in exponents.iter_mut() {
            *exponent = frequency.powf(-config.h);
            frequency *= LACUNARITY;
        }
        Self { config, exponents }
    }

    pub fn config(&self) -> FractalConfig {
        self.config
    }

    pub fn exponents(&self) -> &[f32; OCTAVES] {
        &self.exponents
    }

    /// Sample the fractal at world position `(x, z)`.
    pub fn sample(&self, x: f32, z: f32, seed: WorldSeed) -> f32 {
        let offset = seed.as_offset();
        let scale = self.config.scale;
        let (mut x, mut z) = (x, z);

        let signal_at = |x: f32, z: f32, exponent: f32| {
            let px = x / scale * exponent + offset;
            let pz = z / scale * exponent + offset;
            (1.0 - gradient_noise_2d(px, pz, seed).abs() + OFFSET) * exponent
        };

        let mut result = signal_at(x, z, self.exponents[0]);
        let mut weight = result;
        x *= LACUNARITY;
        z *= LACUNARITY;

        for &exponent in &self.exponents[1..] {
            weight = weight.min(1.0);
            let signal = signal_at(x, z, exponent);
            result += weight * signal;
            weight *= signal;
            x *= LACUNARITY;
            z *= LACUNARITY;
        }
        result
    }
}

/// Hybrid multifractal over gradient noise.
pub fn fractal_sum(x: f32, z: f32, seed: WorldSeed, h: f32, scale: f32) -> f32 {
    HybridMultifractal::new(FractalConfig { h, scale }).sample(x, z, seed)
}

/// Hybrid multifractal entry point used for plain ridged terrain.
pub fn hybrid_multifractal(x: f32, z: f32, seed: WorldSeed, h: f32, scale: f32) -> f32 {
    fractal_sum(x, z, seed, h, scale)
}

/// "Inverted" hybrid multifractal entry point.
///
/// Shares its implementation with [`hybrid_multifractal`]; both build the ridge
/// signal from `1 - |noise|`.
pub fn hybrid_multifractal_inv(x: f32, z: f32, seed: WorldSeed, h: f32, scale: f32) -> f32 {
    fractal_sum(x, z, seed, h, scale)
}

/// Noise layer type for different terrain features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseLayer {
    /// Rolling grassland heights.
    Grassland,
    /// Mountain heights.
    Mountains,
    /// Blend factor between grassland and mountains.
    Biome,
}

impl NoiseLayer {
    pub const ALL: [NoiseLayer; 3] = [
        NoiseLayer::Grassland,
        NoiseLayer::Mountains,
        NoiseLayer::Biome,
    ];

    pub const fn config(self) -> FractalConfig {
        match self {
            NoiseLayer::Grassland => FractalConfig { h: 0.6, scale: 333.0 },
            NoiseLayer::Mountains => FractalConfig { h: 0.5, scale: 200.0 },
            NoiseLayer::Biome => FractalConfig { h: 0.9, scale: 2345.0 },
        }
    }

    /// Tuned `(min, max)` band the raw fractal value is clamped into.
    pub const fn band(self) -> (f32, f32) {
        match self {
            NoiseLayer::Grassland => (1.4, 2.6),
            NoiseLayer::Mountains => (0.9, 1.7),
            NoiseLayer::Biome => (1.5, 1.8),
        }
    }
}

/// One precomputed fractal per [`NoiseLayer`].
#[derive(Debug, Clone)]
pub struct LayeredNoise {
    seed: WorldSeed,
    grassland: HybridMultifractal,
    mountains: HybridMultifractal,
    biome: HybridMultifractal,
}

impl LayeredNoise {
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            grassland: HybridMultifractal::new(NoiseLayer::Grassland.config()),
            mountains: HybridMultifractal::new(NoiseLayer::Mountains.config()),
            biome: HybridMultifractal::new(NoiseLayer::Biome.config()),
        }
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    fn fractal(&self, layer: NoiseLayer) -> &HybridMultifractal {
        match layer {
            NoiseLayer::Grassland => &self.grassland,
            NoiseLayer::Mountains => &self.mountains,
            NoiseLayer::Biome => &self.biome,
        }
    }

    /// Raw fractal value for `layer` at `(x, z)`.
    pub fn sample_raw(&self, layer: NoiseLayer, x: f32, z: f32) -> f32 {
        self.fractal(layer).sample(x, z, self.seed)
    }

    /// Fractal value clamped into the layer's band and renormalized to `[0, 1]`.
    pub fn sample(&self, layer: NoiseLayer, x: f32, z: f32) -> f32 {
        let (min, max) = layer.band();
        remap(self.sample_raw(layer, x, z), min, max)
    }
}
