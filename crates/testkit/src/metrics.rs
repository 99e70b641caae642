//! Metrics schema for terrain generation runs.
//!
//! Reports are exported as JSON so runs with the same seed can be compared and
//! regressions in generation or meshing cost spotted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Top-level metrics report.
///
/// This is the format of the metrics.json files exported by tests and the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test/run identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (ISO 8601)
    pub timestamp: String,

    /// World seed the run used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,

    /// Overall result
    pub result: TestResult,

    /// Terrain generation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainMetrics>,

    /// Meshing metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering: Option<RenderMetrics>,

    /// Execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// Passed all validations
    Pass,
    /// Failed
    Fail,
    /// Skipped
    Skip,
}

/// Terrain generation cost and shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainMetrics {
    /// Zones generated
    pub zones_generated: usize,

    /// Chunks resident after generation
    pub chunks_generated: usize,

    /// Non-empty blocks written
    pub blocks_generated: usize,

    /// Average generation time per zone (microseconds)
    pub avg_zone_time_us: f64,

    /// Total generation time (milliseconds)
    pub total_gen_time_ms: f64,

    /// Lowest surface height seen
    pub min_height: i32,

    /// Highest surface height seen
    pub max_height: i32,

    /// Fraction of columns using the mountain rule (0.0-1.0)
    pub mountain_fraction: f64,
}

/// Meshing cost and output size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMetrics {
    /// Chunks meshed
    pub chunks_meshed: usize,

    /// Total visible faces
    pub total_faces: usize,

    /// Total triangles generated
    pub total_triangles: usize,

    /// Average triangles per chunk
    pub avg_triangles_per_chunk: f64,

    /// Total vertices generated
    pub total_vertices: usize,

    /// Average meshing time per chunk (microseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_mesh_time_us: Option<f64>,
}

/// Execution metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total duration (seconds)
    pub duration_seconds: f64,

    /// Whether generation ran on the background worker
    #[serde(default)]
    pub background: bool,

    /// Number of validations passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations_passed: Option<usize>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with test name
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                seed: None,
                result: TestResult::Pass,
                terrain: None,
                rendering: None,
                test_execution: TestExecutionMetrics::default(),
            },
        }
    }

    /// Set result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Record the world seed
    pub fn seed(mut self, seed: i32) -> Self {
        self.report.seed = Some(seed);
        self
    }

    /// Set terrain metrics
    pub fn terrain(mut self, metrics: TerrainMetrics) -> Self {
        self.report.terrain = Some(metrics);
        self
    }

    /// Set render metrics
    pub fn rendering(mut self, metrics: RenderMetrics) -> Self {
        self.report.rendering = Some(metrics);
        self
    }

    /// Set execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Create a new metrics sink at the specified path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        Ok(Self { path })
    }

    /// Write metrics report to file
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unique_temp_path;

    #[test]
    fn metrics_report_roundtrip() {
        let report = MetricsReportBuilder::new("zone_sweep")
            .seed(42)
            .terrain(TerrainMetrics {
                zones_generated: 9,
                chunks_generated: 144,
                blocks_generated: 1_234_567,
                avg_zone_time_us: 52_000.0,
                total_gen_time_ms: 468.0,
                min_height: 104,
                max_height: 171,
                mountain_fraction: 0.25,
            })
            .rendering(RenderMetrics {
                chunks_meshed: 144,
                total_faces: 90_000,
                total_triangles: 180_000,
                avg_triangles_per_chunk: 1250.0,
                total_vertices: 360_000,
                avg_mesh_time_us: None,
            })
            .build();

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.test_name, "zone_sweep");
        assert_eq!(parsed.seed, Some(42));
        assert_eq!(parsed.result, TestResult::Pass);
        assert_eq!(parsed.terrain.as_ref().unwrap().chunks_generated, 144);
        assert!(!json.contains("avg_mesh_time_us"));
    }

    #[test]
    fn metrics_sink_writes_file() {
        let path = unique_temp_path("metrics", "json");

        let report = MetricsReportBuilder::new("sink_test")
            .result(TestResult::Skip)
            .execution(TestExecutionMetrics {
                duration_seconds: 1.0,
                background: true,
                validations_passed: None,
            })
            .build();

        let sink = MetricsSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"skip\""));
        assert!(!contents.contains("\"seed\""));

        fs::remove_file(&path).ok();
    }
}
