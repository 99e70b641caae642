use crate::config::WorldConfig;
use anyhow::{Context, Result};
use blockfield_core::WorldSeed;
use blockfield_testkit::{ChunkMeshMetric, MeshMetricSink};
use blockfield_world::{Terrain, ZoneWorker, ZONE_WIDTH};
use std::time::Instant;
use tracing::{debug, info};

/// Totals from one driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub seed: WorldSeed,
    pub zones: usize,
    pub chunks: usize,
    pub faces: usize,
    pub triangles: usize,
}

/// Zone origins in a square of `radius` zones around the zone holding the spawn column.
pub fn zones_around(spawn_x: i32, spawn_z: i32, radius: i32) -> Vec<(i32, i32)> {
    let (center_x, center_z) = Terrain::zone_origin_at(spawn_x, spawn_z);
    let radius = radius.max(0);
    let mut zones = Vec::new();
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            zones.push((center_x + dx * ZONE_WIDTH, center_z + dz * ZONE_WIDTH));
        }
    }
    zones
}

pub fn run(cfg: &WorldConfig) -> Result<RunSummary> {
    let seed = cfg.seed.map(WorldSeed).unwrap_or_else(WorldSeed::random);
    let mut terrain = Terrain::new(seed);
    let zones = zones_around(cfg.spawn_x, cfg.spawn_z, cfg.zone_radius);

    let start = Instant::now();
    if cfg.background {
        let worker = ZoneWorker::spawn(seed).context("failed to spawn zone worker")?;
        for &(x, z) in &zones {
            terrain.request_zone(&worker, x, z)?;
        }
        let integrated = terrain.wait_for_pending(&worker);
        debug!(integrated, "background zones integrated");
    } else {
        for &(x, z) in &zones {
            terrain.generate_region(x, z)?;
        }
    }
    let remeshed = terrain.rebuild_dirty_meshes();
    debug!(remeshed, "zone edge meshes refreshed");
    let elapsed = start.elapsed();

    let metrics: Vec<ChunkMeshMetric> = terrain
        .chunks()
        .iter()
        .map(|chunk| {
            let (x, z) = chunk.origin();
            ChunkMeshMetric {
                chunk: [x, z],
                faces: chunk.mesh().face_count(),
                triangles: chunk.mesh().triangle_count(),
                hash: chunk.mesh().hash.to_hex(),
            }
        })
        .collect();

    let summary = RunSummary {
        seed,
        zones: zones.len(),
        chunks: metrics.len(),
        faces: metrics.iter().map(|m| m.faces).sum(),
        triangles: metrics.iter().map(|m| m.triangles).sum(),
    };
    info!(
        %seed,
        zones = summary.zones,
        chunks = summary.chunks,
        faces = summary.faces,
        triangles = summary.triangles,
        elapsed_ms = elapsed.as_millis() as u64,
        background = cfg.background,
        "Terrain generated"
    );

    if let Some(path) = &cfg.mesh_metrics {
        let mut sink = MeshMetricSink::create(path)?;
        sink.write(&metrics)
            .with_context(|| format!("failed to write mesh metrics to {}", path.display()))?;
        info!(path = %sink.path().display(), "Mesh metrics written");
    }

    Ok(summary)
}
