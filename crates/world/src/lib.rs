//! Voxel terrain: block catalog, chunks, noise-driven zone generation and
//! visible-face meshing.

mod block;
mod chunk;
mod direction;
mod heightmap;
mod mesh;
pub mod noise;
mod raycast;
mod storage;
mod terrain;
mod zone;

pub use block::*;
pub use chunk::*;
pub use direction::*;
pub use heightmap::*;
pub use mesh::*;
pub use raycast::*;
pub use storage::*;
pub use terrain::*;
pub use zone::*;

pub use blockfield_core::WorldSeed;
