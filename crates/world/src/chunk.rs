use std::fmt;

use tracing::warn;

use crate::block::BlockKind;
use crate::direction::Direction;
use crate::mesh::ChunkMesh;

/// Chunk width (X axis) in blocks.
pub const CHUNK_SIZE_X: usize = 16;
/// Chunk height (Y axis) in blocks.
pub const CHUNK_SIZE_Y: usize = 256;
/// Chunk depth (Z axis) in blocks.
pub const CHUNK_SIZE_Z: usize = 16;
/// Total block count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Lateral chunk extent in world units.
pub const CHUNK_WIDTH: i32 = CHUNK_SIZE_X as i32;
/// World height; valid Y is `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = CHUNK_SIZE_Y as i32;
/// Lateral extent of a generation zone in world units (4×4 chunks).
pub const ZONE_WIDTH: i32 = 64;

/// Floor-align `value` to a multiple of `step`, rounding towards negative infinity.
#[inline]
pub const fn align_down(value: i32, step: i32) -> i32 {
    value.div_euclid(step) * step
}

/// Linear index of a chunk-local cell.
#[inline]
pub const fn block_index(x: usize, y: usize, z: usize) -> usize {
    x + CHUNK_SIZE_X * y + CHUNK_SIZE_X * CHUNK_SIZE_Y * z
}

/// Packed `(x, z)` origin: x in the high 32 bits, z in the low 32 bits.
///
/// Used for chunk origins (multiples of 16) and zone origins (multiples of 64).
/// Ordering follows the packed integer, which is stable across runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChunkKey(i64);

impl ChunkKey {
    pub const fn new(x: i32, z: i32) -> Self {
        Self(((x as i64) << 32) | (z as u32 as i64))
    }

    /// Key of the chunk containing world column `(x, z)`.
    pub const fn containing(x: i32, z: i32) -> Self {
        Self::new(align_down(x, CHUNK_WIDTH), align_down(z, CHUNK_WIDTH))
    }

    /// Key of the zone containing world column `(x, z)`.
    pub const fn zone_containing(x: i32, z: i32) -> Self {
        Self::new(align_down(x, ZONE_WIDTH), align_down(z, ZONE_WIDTH))
    }

    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn x(self) -> i32 {
        (self.0 >> 32) as i32
    }

    #[inline]
    pub const fn z(self) -> i32 {
        self.0 as i32
    }

    pub const fn origin(self) -> (i32, i32) {
        (self.x(), self.z())
    }

    /// Key of the adjacent chunk in a lateral direction; `None` for vertical
    /// directions and past the edge of the addressable range.
    pub fn neighbor(self, direction: Direction) -> Option<ChunkKey> {
        direction.lateral_slot()?;
        let offset = direction.offset() * CHUNK_WIDTH;
        Some(Self::new(
            self.x().checked_add(offset.x)?,
            self.z().checked_add(offset.z)?,
        ))
    }

    /// Keys of the 4×4 chunks of the zone whose origin is this key, x-outer.
    pub fn zone_chunks(self) -> impl Iterator<Item = ChunkKey> {
        let (zone_x, zone_z) = self.origin();
        let per_side = ZONE_WIDTH / CHUNK_WIDTH;
        (0..per_side).flat_map(move |i| {
            (0..per_side).map(move |j| {
                ChunkKey::new(zone_x + i * CHUNK_WIDTH, zone_z + j * CHUNK_WIDTH)
            })
        })
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.z())
    }
}

/// Read access to resident chunks by key.
///
/// Neighbor links are keys, so any cross-chunk query resolves through one of
/// these.
pub trait ChunkLookup {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk>;
}

impl ChunkLookup for std::collections::BTreeMap<ChunkKey, Chunk> {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.get(&key)
    }
}

/// 16×256×16 column of blocks plus its lateral neighbor links and mesh.
#[derive(Clone)]
pub struct Chunk {
    key: ChunkKey,
    blocks: Vec<BlockKind>,
    neighbors: [Option<ChunkKey>; 4],
    mesh: ChunkMesh,
    mesh_dirty: bool,
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("key", &self.key)
            .field("neighbors", &self.neighbors)
            .field("faces", &self.mesh.face_count())
            .field("mesh_dirty", &self.mesh_dirty)
            .finish()
    }
}

impl Chunk {
    /// Allocate an empty chunk at `key`.
    pub fn new(key: ChunkKey) -> Self {
        Self {
            key,
            blocks: vec![BlockKind::Empty; CHUNK_VOLUME],
            neighbors: [None; 4],
            mesh: ChunkMesh::default(),
            mesh_dirty: true,
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// World-space origin `(x, z)` of the chunk's minimum corner.
    pub fn origin(&self) -> (i32, i32) {
        self.key.origin()
    }

    /// Block at a chunk-local cell. Panics if the cell is outside the chunk.
    #[inline]
    pub fn local_block(&self, x: usize, y: usize, z: usize) -> BlockKind {
        assert!(
            x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z,
            "local cell ({x}, {y}, {z}) outside chunk"
        );
        self.blocks[block_index(x, y, z)]
    }

    /// Block at chunk-relative coordinates.
    ///
    /// Y outside `0..256` is Empty. X or Z up to one chunk outside `0..16` is
    /// answered by the linked neighbor on that axis; a missing neighbor, or an
    /// offset further than one chunk, is Empty.
    pub fn block_at<L>(&self, lookup: &L, x: i32, y: i32, z: i32) -> BlockKind
    where
        L: ChunkLookup + ?Sized,
    {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return BlockKind::Empty;
        }
        let Some((chunk, x)) = hop(self, lookup, x, Direction::XNeg, Direction::XPos) else {
            return BlockKind::Empty;
        };
        let Some((chunk, z)) = hop(chunk, lookup, z, Direction::ZNeg, Direction::ZPos) else {
            return BlockKind::Empty;
        };
        chunk.blocks[block_index(x as usize, y as usize, z as usize)]
    }

    /// Overwrite a chunk-local cell. Panics if the cell is outside the chunk.
    pub fn set_block_at(&mut self, x: usize, y: usize, z: usize, kind: BlockKind) {
        assert!(
            x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z,
            "local cell ({x}, {y}, {z}) outside chunk"
        );
        let slot = &mut self.blocks[block_index(x, y, z)];
        if *slot != kind {
            *slot = kind;
            self.mesh_dirty = true;
        }
    }

    /// Raw block storage in index order.
    pub fn blocks(&self) -> &[BlockKind] {
        &self.blocks
    }

    /// Linked neighbor key in `direction`, if any.
    pub fn neighbor(&self, direction: Direction) -> Option<ChunkKey> {
        direction.lateral_slot().and_then(|slot| self.neighbors[slot])
    }

    /// Link `other` as this chunk's neighbor in `direction`, and this chunk as
    /// `other`'s neighbor in the opposite direction.
    ///
    /// No-op when `other` is absent. Vertical directions have no link slot.
    pub fn link_neighbor(&mut self, other: Option<&mut Chunk>, direction: Direction) {
        let Some(other) = other else {
            return;
        };
        let (Some(slot), Some(back)) = (
            direction.lateral_slot(),
            direction.opposite().lateral_slot(),
        ) else {
            warn!(chunk = %self.key, direction = direction.name(), "ignoring vertical neighbor link");
            return;
        };
        self.neighbors[slot] = Some(other.key);
        other.neighbors[back] = Some(self.key);
        self.mesh_dirty = true;
        other.mesh_dirty = true;
    }

    /// Record a neighbor key without touching the other chunk.
    ///
    /// Used by [`ChunkMap`](crate::ChunkMap) which holds both chunks and links
    /// each side separately.
    pub(crate) fn set_neighbor(&mut self, direction: Direction, key: ChunkKey) {
        if let Some(slot) = direction.lateral_slot() {
            self.neighbors[slot] = Some(key);
            self.mesh_dirty = true;
        }
    }

    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    /// Whether blocks or links changed since the last installed mesh.
    pub fn is_mesh_dirty(&self) -> bool {
        self.mesh_dirty
    }

    /// Replace the mesh wholesale and clear the dirty flag.
    pub fn install_mesh(&mut self, mesh: ChunkMesh) {
        self.mesh = mesh;
        self.mesh_dirty = false;
    }

    /// Rebuild the mesh from the current blocks, resolving neighbors via `lookup`.
    ///
    /// `lookup` must not hold this chunk mutably; chunks owned by a
    /// [`ChunkMap`](crate::ChunkMap) go through
    /// [`ChunkMap::rebuild_mesh`](crate::ChunkMap::rebuild_mesh) instead.
    pub fn build_mesh<L>(&mut self, lookup: &L)
    where
        L: ChunkLookup + ?Sized,
    {
        let mesh = crate::mesh::mesh_chunk(self, lookup);
        self.install_mesh(mesh);
    }
}

/// Resolve one lateral axis: stay, or step once to the linked neighbor.
fn hop<'a, L>(
    chunk: &'a Chunk,
    lookup: &'a L,
    local: i32,
    neg: Direction,
    pos: Direction,
) -> Option<(&'a Chunk, i32)>
where
    L: ChunkLookup + ?Sized,
{
    if (0..CHUNK_WIDTH).contains(&local) {
        Some((chunk, local))
    } else if (-CHUNK_WIDTH..0).contains(&local) {
        Some((lookup.chunk(chunk.neighbor(neg)?)?, local + CHUNK_WIDTH))
    } else if (CHUNK_WIDTH..2 * CHUNK_WIDTH).contains(&local) {
        Some((lookup.chunk(chunk.neighbor(pos)?)?, local - CHUNK_WIDTH))
    } else {
        None
    }
}
