#![warn(missing_docs)]
//! Test and reporting surfaces shared by the worldtests and the headless driver.

mod metrics;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub use metrics::*;

/// Mesh metric snapshot for a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeshMetric {
    /// Chunk origin [x, z] in world units.
    pub chunk: [i32; 2],
    /// Visible faces emitted for the chunk.
    pub faces: usize,
    /// Triangle count for the chunk mesh.
    pub triangles: usize,
    /// Mesh hash (hex string) for deterministic comparisons.
    pub hash: String,
}

/// Writes chunk mesh metrics to JSON for CI artifacts.
pub struct MeshMetricSink {
    path: PathBuf,
    file: File,
}

impl MeshMetricSink {
    /// Create a sink pointed at the supplied path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self { path, file })
    }

    /// Path the sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the provided metrics as pretty JSON.
    pub fn write(&mut self, metrics: &[ChunkMeshMetric]) -> Result<()> {
        let json = serde_json::to_string_pretty(metrics)?;
        self.file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Read back a file written by [`MeshMetricSink`].
pub fn read_mesh_metrics<P: AsRef<Path>>(path: P) -> Result<Vec<ChunkMeshMetric>> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&contents)?)
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh path in the system temp dir, unique per call.
pub fn unique_temp_path(prefix: &str, extension: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "{prefix}-{}-{nanos}-{n}.{extension}",
        std::process::id()
    ))
}
