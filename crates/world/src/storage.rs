use std::collections::BTreeMap;

use tracing::debug;

use crate::chunk::{Chunk, ChunkKey, ChunkLookup};
use crate::direction::Direction;
use crate::mesh::mesh_chunk;

/// In-memory chunk arena.
///
/// Uses BTreeMap for deterministic iteration order. Chunks are never evicted;
/// neighbor links are keys into this map.
#[derive(Debug, Default, Clone)]
pub struct ChunkMap {
    chunks: BTreeMap<ChunkKey, Chunk>,
}

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunks are currently stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    /// Attempt to fetch a chunk immutably.
    pub fn get(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(&key)
    }

    /// Fetch a chunk mutably (without creating it).
    pub fn get_mut(&mut self, key: ChunkKey) -> Option<&mut Chunk> {
        self.chunks.get_mut(&key)
    }

    fn link_resident(&mut self, chunk: &mut Chunk) {
        let key = chunk.key();
        for direction in Direction::LATERAL {
            let Some(neighbor_key) = key.neighbor(direction) else {
                continue;
            };
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_key) {
                chunk.link_neighbor(Some(neighbor), direction);
            }
        }
    }

    /// Insert `chunk` and link it mutually with every resident lateral
    /// neighbor. A chunk already stored under the same key is returned.
    pub fn insert(&mut self, mut chunk: Chunk) -> Option<Chunk> {
        let key = chunk.key();
        self.link_resident(&mut chunk);
        debug!(chunk = %key, "chunk inserted");
        self.chunks.insert(key, chunk)
    }

    /// Like [`ChunkMap::insert`], but only into a vacant key. Returns the
    /// stored chunk, or `None` when the key is already occupied.
    pub fn insert_new(&mut self, mut chunk: Chunk) -> Option<&mut Chunk> {
        let key = chunk.key();
        if self.chunks.contains_key(&key) {
            return None;
        }
        self.link_resident(&mut chunk);
        debug!(chunk = %key, "chunk inserted");
        Some(self.chunks.entry(key).or_insert(chunk))
    }

    /// Link two resident chunks. No-op when either is absent.
    pub fn link(&mut self, key: ChunkKey, direction: Direction) {
        let Some(other) = key.neighbor(direction) else {
            return;
        };
        if !self.contains(key) || !self.contains(other) {
            return;
        }
        if let Some(chunk) = self.chunks.get_mut(&key) {
            chunk.set_neighbor(direction, other);
        }
        if let Some(chunk) = self.chunks.get_mut(&other) {
            chunk.set_neighbor(direction.opposite(), key);
        }
    }

    /// Recompute the mesh of `key` against the current contents of the map.
    /// Returns false when the chunk is absent.
    pub fn rebuild_mesh(&mut self, key: ChunkKey) -> bool {
        let Some(chunk) = self.chunks.get(&key) else {
            return false;
        };
        let mesh = mesh_chunk(chunk, self);
        if let Some(chunk) = self.chunks.get_mut(&key) {
            debug!(chunk = %key, faces = mesh.face_count(), "mesh rebuilt");
            chunk.install_mesh(mesh);
        }
        true
    }

    /// Rebuild every chunk whose blocks or links changed since its last mesh.
    /// Returns the number of chunks rebuilt.
    pub fn rebuild_dirty_meshes(&mut self) -> usize {
        let dirty: Vec<ChunkKey> = self
            .chunks
            .values()
            .filter(|chunk| chunk.is_mesh_dirty())
            .map(Chunk::key)
            .collect();
        for key in &dirty {
            self.rebuild_mesh(*key);
        }
        dirty.len()
    }

    /// Iterate over currently resident chunk keys.
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }
}

impl ChunkLookup for ChunkMap {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;

    #[test]
    fn insert_links_existing_neighbors() {
        let mut map = ChunkMap::new();
        map.insert(Chunk::new(ChunkKey::new(0, 0)));
        map.insert(Chunk::new(ChunkKey::new(16, 0)));
        map.insert(Chunk::new(ChunkKey::new(0, -16)));

        let origin = map.get(ChunkKey::new(0, 0)).unwrap();
        assert_eq!(origin.neighbor(Direction::XPos), Some(ChunkKey::new(16, 0)));
        assert_eq!(origin.neighbor(Direction::ZNeg), Some(ChunkKey::new(0, -16)));
        assert_eq!(origin.neighbor(Direction::XNeg), None);

        let east = map.get(ChunkKey::new(16, 0)).unwrap();
        assert_eq!(east.neighbor(Direction::XNeg), Some(ChunkKey::new(0, 0)));
        let south = map.get(ChunkKey::new(0, -16)).unwrap();
        assert_eq!(south.neighbor(Direction::ZPos), Some(ChunkKey::new(0, 0)));
    }

    #[test]
    fn insert_returns_replaced_chunk() {
        let mut map = ChunkMap::new();
        assert!(map.insert(Chunk::new(ChunkKey::new(0, 0))).is_none());
        assert!(map.insert(Chunk::new(ChunkKey::new(0, 0))).is_some());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_new_refuses_occupied_key() {
        let mut map = ChunkMap::new();
        map.insert(Chunk::new(ChunkKey::new(16, 0)));
        let chunk = map.insert_new(Chunk::new(ChunkKey::new(0, 0))).unwrap();
        assert_eq!(chunk.neighbor(Direction::XPos), Some(ChunkKey::new(16, 0)));
        assert!(map.insert_new(Chunk::new(ChunkKey::new(0, 0))).is_none());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn dirty_meshes_are_rebuilt_once() {
        let mut map = ChunkMap::new();
        let mut a = Chunk::new(ChunkKey::new(0, 0));
        a.set_block_at(15, 5, 5, BlockKind::Stone);
        map.insert(a);
        assert_eq!(map.rebuild_dirty_meshes(), 1);
        assert_eq!(map.get(ChunkKey::new(0, 0)).unwrap().mesh().face_count(), 6);

        let mut b = Chunk::new(ChunkKey::new(16, 0));
        b.set_block_at(0, 5, 5, BlockKind::Stone);
        map.insert(b);
        // The new link dirties the resident chunk as well.
        assert_eq!(map.rebuild_dirty_meshes(), 2);
        assert_eq!(map.get(ChunkKey::new(0, 0)).unwrap().mesh().face_count(), 5);
        assert_eq!(map.rebuild_dirty_meshes(), 0);
    }

    #[test]
    fn link_requires_both_chunks() {
        let mut map = ChunkMap::new();
        map.insert(Chunk::new(ChunkKey::new(0, 0)));
        map.link(ChunkKey::new(0, 0), Direction::ZPos);
        assert_eq!(map.get(ChunkKey::new(0, 0)).unwrap().neighbor(Direction::ZPos), None);
    }

    #[test]
    fn rebuild_mesh_culls_against_neighbors() {
        let mut map = ChunkMap::new();
        let mut a = Chunk::new(ChunkKey::new(0, 0));
        a.set_block_at(15, 5, 5, BlockKind::Stone);
        let mut b = Chunk::new(ChunkKey::new(16, 0));
        b.set_block_at(0, 5, 5, BlockKind::Stone);
        map.insert(a);
        map.insert(b);

        assert!(map.rebuild_mesh(ChunkKey::new(0, 0)));
        let a = map.get(ChunkKey::new(0, 0)).unwrap();
        assert_eq!(a.mesh().face_count(), 5);
        assert!(!a.is_mesh_dirty());
        assert!(!map.rebuild_mesh(ChunkKey::new(64, 64)));
    }

    #[test]
    fn iteration_is_deterministic() {
        let keys = [
            ChunkKey::new(32, 0),
            ChunkKey::new(-16, 16),
            ChunkKey::new(0, -48),
        ];
        let mut a = ChunkMap::new();
        let mut b = ChunkMap::new();
        for key in keys {
            a.insert(Chunk::new(key));
        }
        for key in keys.iter().rev() {
            b.insert(Chunk::new(*key));
        }
        assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    }
}
