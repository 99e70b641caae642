//! Background zone generation.
//!
//! The worker owns its own [`TerrainShaper`] and fills detached chunks. Results
//! travel back over a channel and are linked and meshed by the thread that owns
//! the [`Terrain`](crate::Terrain).

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use blockfield_core::WorldSeed;
use tracing::{debug, info, warn};

use crate::chunk::{Chunk, ChunkKey};
use crate::heightmap::{Heightmap, TerrainShaper};

/// Filled but unlinked chunks of one zone.
#[derive(Debug)]
pub struct GeneratedZone {
    pub origin: ChunkKey,
    pub chunks: Vec<Chunk>,
}

/// Fill the 16 chunks of `zone` without touching any shared state.
pub fn populate_zone(shaper: &TerrainShaper, zone: ChunkKey) -> GeneratedZone {
    let chunks = zone
        .zone_chunks()
        .map(|key| {
            let mut chunk = Chunk::new(key);
            let (x, z) = key.origin();
            Heightmap::generate(shaper, x, z).apply(&mut chunk);
            chunk
        })
        .collect();
    GeneratedZone {
        origin: zone,
        chunks,
    }
}

/// Handle to a zone generation thread.
///
/// Dropping the handle closes the request channel and joins the thread.
pub struct ZoneWorker {
    requests: Option<Sender<ChunkKey>>,
    results: Receiver<GeneratedZone>,
    join: Option<thread::JoinHandle<()>>,
}

impl ZoneWorker {
    pub fn spawn(seed: WorldSeed) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ChunkKey>();
        let (result_tx, result_rx) = mpsc::channel::<GeneratedZone>();

        let join = thread::Builder::new()
            .name("zone-worker".into())
            .spawn(move || {
                let shaper = TerrainShaper::new(seed);
                info!(%seed, "zone worker started");
                for zone in request_rx {
                    debug!(%zone, "generating zone");
                    if result_tx.send(populate_zone(&shaper, zone)).is_err() {
                        warn!(%zone, "zone result dropped; receiver gone");
                        break;
                    }
                }
                debug!("zone worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            join: Some(join),
        })
    }

    /// Queue `zone` for generation. Returns false if the worker has exited.
    pub fn request(&self, zone: ChunkKey) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|tx| tx.send(zone).is_ok())
    }

    /// A finished zone, if one is ready.
    pub fn try_recv(&self) -> Option<GeneratedZone> {
        self.results.try_recv().ok()
    }

    /// Wait for the next finished zone; `None` once the worker has exited.
    pub fn recv(&self) -> Option<GeneratedZone> {
        self.results.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<GeneratedZone> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for ZoneWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("zone worker panicked");
            }
        }
    }
}
