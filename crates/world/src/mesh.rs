//! Visible-face extraction.
//!
//! Every opaque cell contributes one quad per side whose neighbor cell is not
//! opaque. Neighbor cells past the chunk edge resolve through the linked
//! neighbor chunks, so faces against a populated neighbor are culled.

use std::fmt;

use blake3::Hasher;

use crate::block::BlockKind;
use crate::chunk::{Chunk, ChunkLookup, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use crate::direction::Direction;

/// Hash of the combined vertex/index buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for MeshHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Interleaved vertex layout handed to the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local coordinates.
    pub position: [f32; 3],
    /// Face normal (unit length).
    pub normal: [f32; 3],
    /// Block tint.
    pub color: [f32; 3],
}

/// Output mesh buffers per chunk.
#[derive(Debug, Clone, Default)]
pub struct ChunkMesh {
    pub vertices: Vec<MeshVertex>,
    /// Triangle list.
    pub indices: Vec<u32>,
    /// Stable hash of the vertex + index buffers for cache comparisons.
    pub hash: MeshHash,
}

impl ChunkMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of emitted quads.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer as raw bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn push_face(&mut self, cell: [f32; 3], direction: Direction, kind: BlockKind) {
        let initial = self.vertices.len() as u32;
        let corners = direction.vertices();
        let count = corners.len() as u32;
        let normal = direction.normal().to_array();
        let color = kind.color().to_array();
        for corner in corners {
            let p = corner.position;
            self.vertices.push(MeshVertex {
                position: [p[0] + cell[0], p[1] + cell[1], p[2] + cell[2]],
                normal,
                color,
            });
        }
        // Fan around the first corner.
        for i in initial..initial + count - 2 {
            self.indices.extend_from_slice(&[initial, i + 1, i + 2]);
        }
    }

    fn finish(self) -> ChunkMesh {
        let MeshBuilder { vertices, indices } = self;
        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(&vertices));
        hasher.update(bytemuck::cast_slice(&indices));
        ChunkMesh {
            vertices,
            indices,
            hash: MeshHash(*hasher.finalize().as_bytes()),
        }
    }
}

/// Build the visible-face mesh of `chunk`.
///
/// Cells are visited x-outer, y-middle, z-inner and directions in
/// [`Direction::ALL`] order, so the output is a pure function of the blocks.
pub fn mesh_chunk<L>(chunk: &Chunk, lookup: &L) -> ChunkMesh
where
    L: ChunkLookup + ?Sized,
{
    let mut builder = MeshBuilder::default();
    for x in 0..CHUNK_SIZE_X {
        for y in 0..CHUNK_SIZE_Y {
            for z in 0..CHUNK_SIZE_Z {
                let kind = chunk.local_block(x, y, z);
                if !kind.is_opaque() {
                    continue;
                }
                let (xi, yi, zi) = (x as i32, y as i32, z as i32);
                for direction in Direction::ALL {
                    let o = direction.offset();
                    if chunk
                        .block_at(lookup, xi + o.x, yi + o.y, zi + o.z)
                        .is_opaque()
                    {
                        continue;
                    }
                    builder.push_face([x as f32, y as f32, z as f32], direction, kind);
                }
            }
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::chunk::ChunkKey;

    #[test]
    fn lone_block_has_six_faces() {
        let lookup: BTreeMap<ChunkKey, Chunk> = BTreeMap::new();
        let mut chunk = Chunk::new(ChunkKey::new(0, 0));
        chunk.set_block_at(5, 100, 5, BlockKind::Stone);
        let mesh = mesh_chunk(&chunk, &lookup);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.color == BlockKind::Stone.color().to_array()));
    }

    #[test]
    fn lone_block_at_chunk_corner_has_six_faces() {
        let lookup: BTreeMap<ChunkKey, Chunk> = BTreeMap::new();
        let mut chunk = Chunk::new(ChunkKey::new(0, 0));
        chunk.set_block_at(0, 0, 0, BlockKind::Stone);
        let mesh = mesh_chunk(&chunk, &lookup);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.triangle_count(), 12);
        let normals: Vec<_> = mesh.vertices.iter().step_by(4).map(|v| v.normal).collect();
        for direction in Direction::ALL {
            assert!(normals.contains(&direction.normal().to_array()));
        }
    }

    #[test]
    fn shared_face_is_culled() {
        let lookup: BTreeMap<ChunkKey, Chunk> = BTreeMap::new();
        let mut chunk = Chunk::new(ChunkKey::new(0, 0));
        chunk.set_block_at(5, 100, 5, BlockKind::Stone);
        chunk.set_block_at(6, 100, 5, BlockKind::Dirt);
        assert_eq!(mesh_chunk(&chunk, &lookup).face_count(), 10);
    }

    #[test]
    fn empty_chunk_has_empty_mesh() {
        let lookup: BTreeMap<ChunkKey, Chunk> = BTreeMap::new();
        let mesh = mesh_chunk(&Chunk::new(ChunkKey::new(0, 0)), &lookup);
        assert!(mesh.is_empty());
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn quads_are_translated_to_cell_and_fanned() {
        let lookup: BTreeMap<ChunkKey, Chunk> = BTreeMap::new();
        let mut chunk = Chunk::new(ChunkKey::new(0, 0));
        chunk.set_block_at(2, 3, 4, BlockKind::Grass);
        let mesh = mesh_chunk(&chunk, &lookup);
        // First face is +X.
        assert_eq!(mesh.vertices[0].position, [3.0, 3.0, 5.0]);
        assert_eq!(mesh.vertices[0].normal, [1.0, 0.0, 0.0]);
        assert_eq!(&mesh.indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&mesh.indices[6..12], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn neighbor_chunk_culls_boundary_faces() {
        let mut a = Chunk::new(ChunkKey::new(0, 0));
        let mut b = Chunk::new(ChunkKey::new(16, 0));
        a.link_neighbor(Some(&mut b), Direction::XPos);
        a.set_block_at(15, 0, 0, BlockKind::Stone);
        b.set_block_at(0, 0, 0, BlockKind::Stone);
        let mut map = BTreeMap::new();
        map.insert(b.key(), b);
        let mesh = mesh_chunk(&a, &map);
        assert_eq!(mesh.face_count(), 5);
        assert!(mesh.vertices.iter().all(|v| v.normal != [1.0, 0.0, 0.0]));
    }

    #[test]
    fn hash_tracks_content() {
        let lookup: BTreeMap<ChunkKey, Chunk> = BTreeMap::new();
        let mut chunk = Chunk::new(ChunkKey::new(0, 0));
        chunk.set_block_at(1, 1, 1, BlockKind::Stone);
        let first = mesh_chunk(&chunk, &lookup);
        assert_eq!(first.hash, mesh_chunk(&chunk, &lookup).hash);
        chunk.set_block_at(1, 1, 1, BlockKind::Water);
        assert_ne!(first.hash, mesh_chunk(&chunk, &lookup).hash);
        assert_eq!(first.vertex_bytes().len(), first.vertices.len() * 36);
    }
}
