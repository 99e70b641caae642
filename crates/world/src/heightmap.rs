//! Heightmap generation for terrain.
//!
//! Turns the noise layers into a surface height and a biome per world column,
//! and fills chunk columns from those profiles.

use blockfield_core::WorldSeed;

use crate::block::BlockKind;
use crate::chunk::{Chunk, CHUNK_SIZE_X, CHUNK_SIZE_Z};
use crate::noise::{LayeredNoise, NoiseLayer};

/// Columns whose surface is below this are flooded up to it.
pub const WATER_LEVEL: i32 = 138;
/// Grassland dirt reaches down to this height; stone below.
pub const DIRT_FLOOR: i32 = 128;
/// Mountain columns above this are capped with snow.
pub const SNOW_LINE: i32 = 200;

/// Grassland heights span `GRASSLAND_BASE..=GRASSLAND_BASE + GRASSLAND_RANGE`.
pub const GRASSLAND_BASE: f32 = 111.0;
pub const GRASSLAND_RANGE: f32 = 66.0;
/// Mountain heights span `MOUNTAIN_BASE..=MOUNTAIN_BASE + MOUNTAIN_RANGE`.
pub const MOUNTAIN_BASE: f32 = 100.0;
pub const MOUNTAIN_RANGE: f32 = 80.0;

/// Which fill rule a column uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Grassland,
    Mountains,
}

/// Surface height and biome of one world column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnProfile {
    pub height: i32,
    /// Blend factor in `[0, 1]`; zero is pure grassland.
    pub blend: f32,
    pub biome: Biome,
}

/// Per-column height/biome pipeline.
#[derive(Debug, Clone)]
pub struct TerrainShaper {
    noise: LayeredNoise,
}

impl TerrainShaper {
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            noise: LayeredNoise::new(seed),
        }
    }

    pub fn seed(&self) -> WorldSeed {
        self.noise.seed()
    }

    pub fn grassland_height(&self, x: i32, z: i32) -> i32 {
        let t = self.noise.sample(NoiseLayer::Grassland, x as f32, z as f32);
        (GRASSLAND_RANGE * t + GRASSLAND_BASE) as i32
    }

    pub fn mountain_height(&self, x: i32, z: i32) -> i32 {
        let t = self.noise.sample(NoiseLayer::Mountains, x as f32, z as f32);
        (MOUNTAIN_RANGE * t + MOUNTAIN_BASE) as i32
    }

    pub fn biome_blend(&self, x: i32, z: i32) -> f32 {
        self.noise.sample(NoiseLayer::Biome, x as f32, z as f32)
    }

    /// Height and biome of world column `(x, z)`.
    pub fn column(&self, x: i32, z: i32) -> ColumnProfile {
        let blend = self.biome_blend(x, z);
        let grassland = self.grassland_height(x, z) as f32;
        let mountains = self.mountain_height(x, z) as f32;
        let height = (grassland * (1.0 - blend) + mountains * blend).round() as i32;
        let biome = if blend > 0.5 {
            Biome::Mountains
        } else {
            Biome::Grassland
        };
        ColumnProfile {
            height,
            blend,
            biome,
        }
    }
}

/// Fill local column `(x, z)` of `chunk` from `profile`.
pub fn fill_column(chunk: &mut Chunk, x: usize, z: usize, profile: ColumnProfile) {
    match profile.biome {
        Biome::Grassland => fill_grassland(chunk, x, z, profile.height),
        Biome::Mountains => fill_mountain(chunk, x, z, profile.height),
    }
}

fn flood(chunk: &mut Chunk, x: usize, z: usize, height: i32) {
    if height < WATER_LEVEL {
        for y in (height + 1)..=WATER_LEVEL {
            chunk.set_block_at(x, y as usize, z, BlockKind::Water);
        }
    }
}

fn fill_down(chunk: &mut Chunk, x: usize, z: usize, top: i32, bottom: i32, kind: BlockKind) {
    for y in bottom.max(0)..=top {
        chunk.set_block_at(x, y as usize, z, kind);
    }
}

/// Water to the water level, grass on top above the dirt floor, dirt down to
/// the dirt floor, stone below.
pub fn fill_grassland(chunk: &mut Chunk, x: usize, z: usize, height: i32) {
    flood(chunk, x, z, height);
    let mut current = height;
    if current > DIRT_FLOOR {
        chunk.set_block_at(x, current as usize, z, BlockKind::Grass);
        current -= 1;
    }
    if current >= DIRT_FLOOR {
        fill_down(chunk, x, z, current, DIRT_FLOOR, BlockKind::Dirt);
        current = DIRT_FLOOR - 1;
    }
    fill_down(chunk, x, z, current, 0, BlockKind::Stone);
}

/// Water to the water level, snow on top above the snow line, stone below.
pub fn fill_mountain(chunk: &mut Chunk, x: usize, z: usize, height: i32) {
    flood(chunk, x, z, height);
    let mut current = height;
    if current > SNOW_LINE {
        chunk.set_block_at(x, current as usize, z, BlockKind::Snow);
        current -= 1;
    }
    fill_down(chunk, x, z, current, 0, BlockKind::Stone);
}

/// Column profiles for a single chunk (16x16), indexed `[z][x]`.
pub struct Heightmap {
    columns: [[ColumnProfile; CHUNK_SIZE_X]; CHUNK_SIZE_Z],
}

impl Heightmap {
    /// Sample every column of the chunk whose origin is `(origin_x, origin_z)`.
    pub fn generate(shaper: &TerrainShaper, origin_x: i32, origin_z: i32) -> Self {
        let blank = ColumnProfile {
            height: 0,
            blend: 0.0,
            biome: Biome::Grassland,
        };
        let mut columns = [[blank; CHUNK_SIZE_X]; CHUNK_SIZE_Z];
        for (local_z, row) in columns.iter_mut().enumerate() {
            for (local_x, cell) in row.iter_mut().enumerate() {
                *cell = shaper.column(origin_x + local_x as i32, origin_z + local_z as i32);
            }
        }
        Self { columns }
    }

    /// Profile of local column `(x, z)`. Panics if out of bounds.
    pub fn get(&self, local_x: usize, local_z: usize) -> ColumnProfile {
        assert!(local_x < CHUNK_SIZE_X, "local_x out of bounds");
        assert!(local_z < CHUNK_SIZE_Z, "local_z out of bounds");
        self.columns[local_z][local_x]
    }

    /// Fill every column of `chunk` from this heightmap.
    pub fn apply(&self, chunk: &mut Chunk) {
        for (local_z, row) in self.columns.iter().enumerate() {
            for (local_x, profile) in row.iter().enumerate() {
                fill_column(chunk, local_x, local_z, *profile);
            }
        }
    }

    fn heights(&self) -> impl Iterator<Item = i32> + '_ {
        self.columns.iter().flatten().map(|c| c.height)
    }

    pub fn min_height(&self) -> i32 {
        self.heights().min().unwrap_or(0)
    }

    pub fn max_height(&self) -> i32 {
        self.heights().max().unwrap_or(0)
    }

    pub fn avg_height(&self) -> f32 {
        self.heights().sum::<i32>() as f32 / (CHUNK_SIZE_X * CHUNK_SIZE_Z) as f32
    }

    /// Number of columns using the mountain rule.
    pub fn mountain_columns(&self) -> usize {
        self.columns
            .iter()
            .flatten()
            .filter(|c| c.biome == Biome::Mountains)
            .count()
    }
}
