//! Block catalog.
//!
//! A closed set of block kinds with per-kind opacity and tint. Attributes live in
//! `const` tables indexed by the kind's stable `u8` index.

use std::fmt;

/// Linear RGB tint in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a tint from 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Every kind of block the world can hold.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BlockKind {
    #[default]
    Empty = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Water = 4,
    Snow = 5,
}

const OPAQUE: [bool; BlockKind::COUNT] = [false, true, true, true, true, true];

const COLORS: [Rgb; BlockKind::COUNT] = [
    Rgb::new(1.0, 1.0, 1.0),
    Rgb::new(95.0 / 255.0, 159.0 / 255.0, 53.0 / 255.0),
    Rgb::new(121.0 / 255.0, 85.0 / 255.0, 58.0 / 255.0),
    Rgb::new(0.5, 0.5, 0.5),
    Rgb::new(0.0, 0.0, 0.75),
    Rgb::new(1.0, 1.0, 1.0),
];

const NAMES: [&str; BlockKind::COUNT] = ["empty", "grass", "dirt", "stone", "water", "snow"];

impl BlockKind {
    /// Number of block kinds.
    pub const COUNT: usize = 6;

    /// All kinds in index order.
    pub const ALL: [BlockKind; BlockKind::COUNT] = [
        BlockKind::Empty,
        BlockKind::Grass,
        BlockKind::Dirt,
        BlockKind::Stone,
        BlockKind::Water,
        BlockKind::Snow,
    ];

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Empty),
            1 => Some(Self::Grass),
            2 => Some(Self::Dirt),
            3 => Some(Self::Stone),
            4 => Some(Self::Water),
            5 => Some(Self::Snow),
            _ => None,
        }
    }

    /// Whether the block hides faces behind it and stops ray queries.
    #[inline]
    pub const fn is_opaque(self) -> bool {
        OPAQUE[self as usize]
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub const fn color(self) -> Rgb {
        COLORS[self as usize]
    }

    pub const fn name(self) -> &'static str {
        NAMES[self as usize]
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
