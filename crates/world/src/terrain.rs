//! Terrain: the sparse chunk map plus zone generation.
//!
//! The world is generated in 64×64 zones of 4×4 chunks. A zone is marked
//! generated before its columns are filled, so repeated requests are no-ops.

use std::collections::BTreeSet;

use blockfield_core::WorldSeed;
use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::block::BlockKind;
use crate::chunk::{
    align_down, Chunk, ChunkKey, ChunkLookup, CHUNK_WIDTH, WORLD_HEIGHT, ZONE_WIDTH,
};
use crate::heightmap::{Heightmap, TerrainShaper};
use crate::mesh::ChunkMesh;
use crate::storage::ChunkMap;
use crate::zone::{GeneratedZone, ZoneWorker};

/// Errors from terrain queries and edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// No chunk has been instantiated at the queried column.
    #[error("coordinates {x} {y} {z} have no chunk")]
    NoChunk { x: i32, y: i32, z: i32 },
    /// Writes must stay inside `0..256`.
    #[error("y = {y} is outside the world")]
    OutOfWorld { y: i32 },
    #[error("chunk origin ({x}, {z}) is not a multiple of 16")]
    MisalignedOrigin { x: i32, z: i32 },
    #[error("zone origin ({x}, {z}) is not a multiple of 64")]
    MisalignedZone { x: i32, z: i32 },
    #[error("chunk {0} already exists")]
    DuplicateChunk(ChunkKey),
}

/// Consumer of per-chunk meshes, e.g. a GPU renderer.
pub trait RenderTarget {
    /// Draw `mesh` translated to the chunk origin.
    fn draw_chunk(&mut self, translation: Vec3, mesh: &ChunkMesh);
}

/// The generated world.
pub struct Terrain {
    shaper: TerrainShaper,
    chunks: ChunkMap,
    zones: BTreeSet<ChunkKey>,
    pending: BTreeSet<ChunkKey>,
}

impl Terrain {
    pub fn new(seed: WorldSeed) -> Self {
        info!(%seed, "terrain created");
        Self {
            shaper: TerrainShaper::new(seed),
            chunks: ChunkMap::new(),
            zones: BTreeSet::new(),
            pending: BTreeSet::new(),
        }
    }

    /// Terrain with a freshly drawn seed.
    pub fn with_random_seed() -> Self {
        Self::new(WorldSeed::random())
    }

    pub fn seed(&self) -> WorldSeed {
        self.shaper.seed()
    }

    pub fn shaper(&self) -> &TerrainShaper {
        &self.shaper
    }

    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    /// Origins of every zone marked generated, including ones still pending on
    /// a worker.
    pub fn zones(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.zones.iter().copied()
    }

    /// Zones dispatched to a worker but not yet integrated.
    pub fn pending_zones(&self) -> usize {
        self.pending.len()
    }

    /// Whether a chunk covers world column `(x, z)`.
    pub fn has_chunk_at(&self, x: i32, z: i32) -> bool {
        self.chunks.contains(ChunkKey::containing(x, z))
    }

    pub fn chunk_at(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.chunks.get(ChunkKey::containing(x, z))
    }

    pub fn chunk_at_mut(&mut self, x: i32, z: i32) -> Option<&mut Chunk> {
        self.chunks.get_mut(ChunkKey::containing(x, z))
    }

    /// Block at world position `(x, y, z)`.
    ///
    /// Errors when no chunk covers the column; Y outside the world is Empty.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Result<BlockKind, TerrainError> {
        let chunk = self
            .chunk_at(x, z)
            .ok_or(TerrainError::NoChunk { x, y, z })?;
        if !(0..WORLD_HEIGHT).contains(&y) {
            return Ok(BlockKind::Empty);
        }
        let (origin_x, origin_z) = chunk.origin();
        Ok(chunk.block_at(&self.chunks, x - origin_x, y, z - origin_z))
    }

    /// Overwrite the block at world position `(x, y, z)`.
    ///
    /// The containing chunk's mesh is not rebuilt; see
    /// [`Terrain::rebuild_chunk_mesh`].
    pub fn set_block_at(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        kind: BlockKind,
    ) -> Result<(), TerrainError> {
        let chunk = self
            .chunks
            .get_mut(ChunkKey::containing(x, z))
            .ok_or(TerrainError::NoChunk { x, y, z })?;
        if !(0..WORLD_HEIGHT).contains(&y) {
            return Err(TerrainError::OutOfWorld { y });
        }
        let (origin_x, origin_z) = chunk.origin();
        chunk.set_block_at(
            (x - origin_x) as usize,
            y as usize,
            (z - origin_z) as usize,
            kind,
        );
        Ok(())
    }

    /// Create an empty chunk at a chunk-aligned origin and link it to its
    /// resident lateral neighbors.
    pub fn instantiate_chunk_at(
        &mut self,
        origin_x: i32,
        origin_z: i32,
    ) -> Result<&mut Chunk, TerrainError> {
        if origin_x % CHUNK_WIDTH != 0 || origin_z % CHUNK_WIDTH != 0 {
            return Err(TerrainError::MisalignedOrigin {
                x: origin_x,
                z: origin_z,
            });
        }
        let key = ChunkKey::new(origin_x, origin_z);
        self.chunks
            .insert_new(Chunk::new(key))
            .ok_or(TerrainError::DuplicateChunk(key))
    }

    /// Floor-align world column `(x, z)` to its zone origin.
    pub fn zone_origin_at(x: i32, z: i32) -> (i32, i32) {
        (align_down(x, ZONE_WIDTH), align_down(z, ZONE_WIDTH))
    }

    pub fn is_zone_generated(&self, x: i32, z: i32) -> bool {
        self.zones.contains(&ChunkKey::zone_containing(x, z))
    }

    fn check_zone_origin(zone_x: i32, zone_z: i32) -> Result<ChunkKey, TerrainError> {
        if zone_x % ZONE_WIDTH != 0 || zone_z % ZONE_WIDTH != 0 {
            return Err(TerrainError::MisalignedZone {
                x: zone_x,
                z: zone_z,
            });
        }
        Ok(ChunkKey::new(zone_x, zone_z))
    }

    /// Instantiate any missing chunks of `zone` and mark it generated.
    fn prepare_zone(&mut self, zone: ChunkKey) {
        for key in zone.zone_chunks() {
            if !self.chunks.contains(key) {
                self.chunks.insert(Chunk::new(key));
            }
        }
        self.zones.insert(zone);
    }

    fn rebuild_zone_meshes(&mut self, zone: ChunkKey) {
        for key in zone.zone_chunks() {
            self.chunks.rebuild_mesh(key);
        }
    }

    /// Generate the zone whose origin is `(zone_x, zone_z)`.
    ///
    /// Returns `Ok(false)` when the zone was already generated. Chunks that
    /// already exist inside the zone are filled in place.
    #[instrument(skip(self), fields(seed = %self.seed()))]
    pub fn generate_region(&mut self, zone_x: i32, zone_z: i32) -> Result<bool, TerrainError> {
        let zone = Self::check_zone_origin(zone_x, zone_z)?;
        if self.zones.contains(&zone) {
            return Ok(false);
        }
        debug!("Starting zone generation");
        self.prepare_zone(zone);
        for key in zone.zone_chunks() {
            let (origin_x, origin_z) = key.origin();
            let heightmap = Heightmap::generate(&self.shaper, origin_x, origin_z);
            if let Some(chunk) = self.chunks.get_mut(key) {
                heightmap.apply(chunk);
            }
        }
        self.rebuild_zone_meshes(zone);
        debug!(chunks = self.chunks.len(), "Zone generation complete");
        Ok(true)
    }

    /// Generate the zone containing world column `(x, z)` if needed.
    pub fn ensure_zone_at(&mut self, x: i32, z: i32) -> Result<bool, TerrainError> {
        let (zone_x, zone_z) = Self::zone_origin_at(x, z);
        self.generate_region(zone_x, zone_z)
    }

    /// Recompute the mesh of the chunk containing world column `(x, z)`.
    pub fn rebuild_chunk_mesh(&mut self, x: i32, z: i32) -> Result<(), TerrainError> {
        if self.chunks.rebuild_mesh(ChunkKey::containing(x, z)) {
            Ok(())
        } else {
            Err(TerrainError::NoChunk { x, y: 0, z })
        }
    }

    /// Rebuild the mesh of the chunk containing `(x, z)` and of any neighbor
    /// chunk sharing the cell's face, for use after a single-block edit.
    pub fn rebuild_meshes_around(&mut self, x: i32, z: i32) -> Result<(), TerrainError> {
        self.rebuild_chunk_mesh(x, z)?;
        let (origin_x, origin_z) = ChunkKey::containing(x, z).origin();
        let (local_x, local_z) = (x - origin_x, z - origin_z);
        let mut touch = |wx: Option<i32>, wz: Option<i32>| {
            if let (Some(wx), Some(wz)) = (wx, wz) {
                self.chunks.rebuild_mesh(ChunkKey::containing(wx, wz));
            }
        };
        if local_x == 0 {
            touch(x.checked_sub(1), Some(z));
        }
        if local_x == CHUNK_WIDTH - 1 {
            touch(x.checked_add(1), Some(z));
        }
        if local_z == 0 {
            touch(Some(x), z.checked_sub(1));
        }
        if local_z == CHUNK_WIDTH - 1 {
            touch(Some(x), z.checked_add(1));
        }
        Ok(())
    }

    /// Rebuild every chunk whose blocks or links changed since its last mesh,
    /// such as the edge chunks of a zone generated before its neighbor.
    /// Returns the number of chunks rebuilt.
    pub fn rebuild_dirty_meshes(&mut self) -> usize {
        let rebuilt = self.chunks.rebuild_dirty_meshes();
        debug!(rebuilt, "dirty meshes rebuilt");
        rebuilt
    }

    /// Issue one draw per existing chunk whose origin lies in
    /// `[min_x, max_x) × [min_z, max_z)`, stepping one chunk at a time.
    /// Returns the number of chunks drawn.
    pub fn draw<R>(&self, min_x: i32, max_x: i32, min_z: i32, max_z: i32, target: &mut R) -> usize
    where
        R: RenderTarget + ?Sized,
    {
        let mut drawn = 0;
        for x in (min_x..max_x).step_by(CHUNK_WIDTH as usize) {
            for z in (min_z..max_z).step_by(CHUNK_WIDTH as usize) {
                let Some(chunk) = self.chunk_at(x, z) else {
                    continue;
                };
                let (origin_x, origin_z) = chunk.origin();
                target.draw_chunk(
                    Vec3::new(origin_x as f32, 0.0, origin_z as f32),
                    chunk.mesh(),
                );
                drawn += 1;
            }
        }
        drawn
    }

    /// Replace the zone at the origin with the fixed debug scene: a
    /// checkerboard floor at y = 128, grass walls and a central column.
    pub fn build_test_scene(&mut self) -> Result<(), TerrainError> {
        let zone = ChunkKey::new(0, 0);
        self.prepare_zone(zone);

        for x in 0..ZONE_WIDTH {
            for z in 0..ZONE_WIDTH {
                let kind = if (x + z) % 2 == 0 {
                    BlockKind::Stone
                } else {
                    BlockKind::Dirt
                };
                self.set_block_at(x, 128, z, kind)?;
            }
        }

        for i in 0..ZONE_WIDTH {
            self.set_block_at(i, 129, 0, BlockKind::Grass)?;
            self.set_block_at(i, 130, 0, BlockKind::Grass)?;
            self.set_block_at(i, 129, ZONE_WIDTH - 1, BlockKind::Grass)?;
            self.set_block_at(0, 130, i, BlockKind::Grass)?;
        }

        for y in 129..140 {
            self.set_block_at(32, y, 32, BlockKind::Grass)?;
        }
        self.set_block_at(32, 139, 32, BlockKind::Stone)?;

        self.rebuild_zone_meshes(zone);
        info!("test scene built");
        Ok(())
    }

    /// Dispatch the zone at `(zone_x, zone_z)` to `worker`.
    ///
    /// The zone is marked before dispatch, so repeated requests return
    /// `Ok(false)`. Its chunks appear only once
    /// [`Terrain::integrate_ready_zones`] picks up the result.
    pub fn request_zone(
        &mut self,
        worker: &ZoneWorker,
        zone_x: i32,
        zone_z: i32,
    ) -> Result<bool, TerrainError> {
        let zone = Self::check_zone_origin(zone_x, zone_z)?;
        if self.zones.contains(&zone) {
            return Ok(false);
        }
        if !worker.request(zone) {
            debug!(%zone, "zone worker gone; generating inline");
            return self.generate_region(zone_x, zone_z);
        }
        self.zones.insert(zone);
        self.pending.insert(zone);
        Ok(true)
    }

    /// Insert, link and mesh every zone `worker` has finished. Returns the
    /// number of zones integrated.
    pub fn integrate_ready_zones(&mut self, worker: &ZoneWorker) -> usize {
        let mut integrated = 0;
        while let Some(zone) = worker.try_recv() {
            self.integrate_zone(zone);
            integrated += 1;
        }
        integrated
    }

    /// Block until every pending zone has been integrated.
    pub fn wait_for_pending(&mut self, worker: &ZoneWorker) -> usize {
        let mut integrated = 0;
        while !self.pending.is_empty() {
            let Some(zone) = worker.recv() else {
                break;
            };
            self.integrate_zone(zone);
            integrated += 1;
        }
        integrated
    }

    fn integrate_zone(&mut self, generated: GeneratedZone) {
        let GeneratedZone { origin, chunks } = generated;
        self.pending.remove(&origin);
        self.zones.insert(origin);
        for chunk in chunks {
            if self.chunks.insert(chunk).is_some() {
                debug!(zone = %origin, "replaced resident chunk with generated one");
            }
        }
        self.rebuild_zone_meshes(origin);
        debug!(zone = %origin, "zone integrated");
    }
}

impl ChunkLookup for Terrain {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    #[derive(Default)]
    struct RecordingTarget {
        draws: Vec<(Vec3, usize)>,
    }

    impl RenderTarget for RecordingTarget {
        fn draw_chunk(&mut self, translation: Vec3, mesh: &ChunkMesh) {
            self.draws.push((translation, mesh.face_count()));
        }
    }

    #[test]
    fn queries_without_chunk_fail() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        assert_eq!(
            terrain.block_at(1, 2, 3),
            Err(TerrainError::NoChunk { x: 1, y: 2, z: 3 })
        );
        assert!(terrain.set_block_at(1, 2, 3, BlockKind::Stone).is_err());
        assert!(!terrain.has_chunk_at(0, 0));
    }

    #[test]
    fn has_chunk_at_floors_negative_coordinates() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        terrain.instantiate_chunk_at(-16, -16).unwrap();
        assert!(terrain.has_chunk_at(-1, -1));
        assert!(terrain.has_chunk_at(-16, -16));
        assert!(!terrain.has_chunk_at(0, -1));
        assert!(!terrain.has_chunk_at(-17, -1));
    }

    #[test]
    fn set_and_get_roundtrip_across_chunks() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        terrain.instantiate_chunk_at(-16, 0).unwrap();
        terrain.instantiate_chunk_at(0, 0).unwrap();
        terrain.set_block_at(-1, 64, 5, BlockKind::Snow).unwrap();
        assert_eq!(terrain.block_at(-1, 64, 5), Ok(BlockKind::Snow));
        let east = terrain.chunk_at(0, 0).unwrap();
        assert_eq!(east.block_at(&terrain, -1, 64, 5), BlockKind::Snow);
    }

    #[test]
    fn vertical_bounds() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        terrain.instantiate_chunk_at(0, 0).unwrap();
        assert_eq!(terrain.block_at(0, -1, 0), Ok(BlockKind::Empty));
        assert_eq!(terrain.block_at(0, 256, 0), Ok(BlockKind::Empty));
        assert_eq!(
            terrain.set_block_at(0, 256, 0, BlockKind::Stone),
            Err(TerrainError::OutOfWorld { y: 256 })
        );
    }

    #[test]
    fn instantiate_rejects_bad_origins() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        assert_eq!(
            terrain.instantiate_chunk_at(8, 0).map(|c| c.key()),
            Err(TerrainError::MisalignedOrigin { x: 8, z: 0 })
        );
        terrain.instantiate_chunk_at(16, 0).unwrap();
        assert_eq!(
            terrain.instantiate_chunk_at(16, 0).map(|c| c.key()),
            Err(TerrainError::DuplicateChunk(ChunkKey::new(16, 0)))
        );
    }

    #[test]
    fn instantiate_at_the_addressable_edge() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        let far = i32::MAX - 15;
        terrain.instantiate_chunk_at(far - 16, 0).unwrap();
        let chunk = terrain.instantiate_chunk_at(far, 0).unwrap();
        assert_eq!(chunk.neighbor(Direction::XPos), None);
        assert_eq!(
            chunk.neighbor(Direction::XNeg),
            Some(ChunkKey::new(far - 16, 0))
        );
        terrain.set_block_at(i32::MAX, 10, 15, BlockKind::Stone).unwrap();
        terrain.rebuild_meshes_around(i32::MAX, 15).unwrap();
        assert_eq!(terrain.chunk_at(far, 0).unwrap().mesh().face_count(), 6);
    }

    #[test]
    fn later_zone_dirties_earlier_edge_chunks() {
        let mut terrain = Terrain::new(WorldSeed(3));
        terrain.generate_region(0, 0).unwrap();
        terrain.generate_region(64, 0).unwrap();
        let edge = terrain.chunk_at(48, 0).unwrap();
        assert!(edge.is_mesh_dirty());
        let stale_faces = edge.mesh().face_count();

        assert_eq!(terrain.rebuild_dirty_meshes(), 4);
        let edge = terrain.chunk_at(48, 0).unwrap();
        assert!(!edge.is_mesh_dirty());
        // The +X wall against the new zone is now hidden.
        assert!(edge.mesh().face_count() < stale_faces);
        assert!(terrain.chunks().iter().all(|c| !c.is_mesh_dirty()));
        assert_eq!(terrain.rebuild_dirty_meshes(), 0);
    }

    #[test]
    fn zone_origins_floor() {
        assert_eq!(Terrain::zone_origin_at(0, 0), (0, 0));
        assert_eq!(Terrain::zone_origin_at(63, 64), (0, 64));
        assert_eq!(Terrain::zone_origin_at(-1, -64), (-64, -64));
        assert_eq!(Terrain::zone_origin_at(-65, 130), (-128, 128));
    }

    #[test]
    fn generate_region_rejects_misaligned_zone() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        assert_eq!(
            terrain.generate_region(16, 0),
            Err(TerrainError::MisalignedZone { x: 16, z: 0 })
        );
    }

    #[test]
    fn generate_region_is_idempotent() {
        let mut terrain = Terrain::new(WorldSeed(3));
        assert_eq!(terrain.generate_region(0, 0), Ok(true));
        let hashes: Vec<_> = terrain.chunks().iter().map(|c| c.mesh().hash).collect();
        assert_eq!(terrain.generate_region(0, 0), Ok(false));
        assert_eq!(terrain.chunks().len(), 16);
        let again: Vec<_> = terrain.chunks().iter().map(|c| c.mesh().hash).collect();
        assert_eq!(hashes, again);
        assert!(terrain.is_zone_generated(63, 63));
        assert!(!terrain.is_zone_generated(64, 0));
    }

    #[test]
    fn draw_skips_missing_chunks() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        terrain.build_test_scene().unwrap();
        let mut target = RecordingTarget::default();
        let drawn = terrain.draw(-16, 80, 0, 16, &mut target);
        assert_eq!(drawn, 4);
        assert_eq!(target.draws[0].0, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(target.draws[3].0, Vec3::new(48.0, 0.0, 0.0));
        assert!(target.draws.iter().all(|(_, faces)| *faces > 0));
    }

    #[test]
    fn test_scene_layout() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        terrain.build_test_scene().unwrap();
        assert_eq!(terrain.block_at(0, 128, 0), Ok(BlockKind::Stone));
        assert_eq!(terrain.block_at(1, 128, 0), Ok(BlockKind::Dirt));
        assert_eq!(terrain.block_at(10, 130, 0), Ok(BlockKind::Grass));
        assert_eq!(terrain.block_at(10, 129, 63), Ok(BlockKind::Grass));
        assert_eq!(terrain.block_at(0, 130, 40), Ok(BlockKind::Grass));
        assert_eq!(terrain.block_at(32, 138, 32), Ok(BlockKind::Grass));
        assert_eq!(terrain.block_at(32, 139, 32), Ok(BlockKind::Stone));
        assert_eq!(terrain.block_at(32, 140, 32), Ok(BlockKind::Empty));
        assert!(terrain.is_zone_generated(0, 0));
        assert_eq!(terrain.generate_region(0, 0), Ok(false));
    }

    #[test]
    fn edits_rebuild_neighbor_meshes() {
        let mut terrain = Terrain::new(WorldSeed::ZERO);
        terrain.build_test_scene().unwrap();
        terrain.set_block_at(16, 129, 5, BlockKind::Stone).unwrap();
        terrain.rebuild_meshes_around(16, 5).unwrap();
        let before = terrain.chunk_at(16, 0).unwrap().mesh().hash;
        terrain.set_block_at(15, 129, 5, BlockKind::Stone).unwrap();
        terrain.rebuild_meshes_around(15, 5).unwrap();
        assert!(!terrain.chunk_at(0, 0).unwrap().is_mesh_dirty());
        // The neighbor's x = 0 face against the new block is now hidden.
        assert_ne!(terrain.chunk_at(16, 0).unwrap().mesh().hash, before);
    }
}
