use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::warn;

pub const DEFAULT_WORLD_PATH: &str = "config/world.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Fixed world seed; a fresh one is drawn when absent.
    pub seed: Option<i32>,
    /// World column the driver generates around.
    pub spawn_x: i32,
    pub spawn_z: i32,
    /// Zones generated on each side of the spawn zone.
    pub zone_radius: i32,
    /// Run zone generation on the background worker.
    pub background: bool,
    /// Where to write per-chunk mesh metrics, if anywhere.
    pub mesh_metrics: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            spawn_x: 0,
            spawn_z: 0,
            zone_radius: 1,
            background: false,
            mesh_metrics: None,
        }
    }
}

impl WorldConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_WORLD_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<WorldConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    WorldConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_WORLD_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("World config not found at {}. Using defaults", path.display());
                }
                WorldConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfield_testkit::unique_temp_path;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: WorldConfig = toml::from_str("seed = 7\nbackground = true\n").unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert!(cfg.background);
        assert_eq!(cfg.zone_radius, 1);
        assert_eq!(cfg.mesh_metrics, None);
    }

    #[test]
    fn missing_or_malformed_file_falls_back() {
        let missing = unique_temp_path("world-missing", "toml");
        assert_eq!(WorldConfig::load_from_path(&missing), WorldConfig::default());

        let bad = unique_temp_path("world-bad", "toml");
        fs::write(&bad, "zone_radius = \"wide\"").unwrap();
        assert_eq!(WorldConfig::load_from_path(&bad), WorldConfig::default());
        fs::remove_file(&bad).ok();
    }

    #[test]
    fn save_then_load() {
        let path = unique_temp_path("world", "toml");
        let cfg = WorldConfig {
            seed: Some(-12),
            spawn_x: -100,
            spawn_z: 300,
            zone_radius: 2,
            background: true,
            mesh_metrics: Some(PathBuf::from("target/mesh.json")),
        };
        cfg.save_to_path(&path).unwrap();
        assert_eq!(WorldConfig::load_from_path(&path), cfg);
        fs::remove_file(&path).ok();
    }
}
