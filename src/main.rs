//! blockfield - deterministic voxel terrain generation
//!
//! Headless driver: generates the zones around a spawn column and reports
//! chunk and mesh totals.

mod config;
mod headless;

use anyhow::Result;
use config::WorldConfig;
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // INFO by default; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting blockfield v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if cli.help {
        print_usage();
        return Ok(());
    }

    let mut cfg = match &cli.config {
        Some(path) => WorldConfig::load_from_path(path),
        None => WorldConfig::load(),
    };
    cli.apply(&mut cfg);

    let summary = headless::run(&cfg)?;
    info!(
        seed = %summary.seed,
        chunks = summary.chunks,
        "Done"
    );
    Ok(())
}

fn print_usage() {
    println!(
        "Usage: blockfield [--config PATH] [--seed N] [--radius N] \
         [--mesh-metrics PATH] [--background]"
    );
}

#[derive(Debug, Default)]
struct CliOptions {
    help: bool,
    config: Option<PathBuf>,
    seed: Option<i32>,
    radius: Option<i32>,
    mesh_metrics: Option<PathBuf>,
    background: bool,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "--background" => opts.background = true,
                "--config" => {
                    if let Some(path) = args.next() {
                        opts.config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--config requires a file path");
                    }
                }
                "--mesh-metrics" => {
                    if let Some(path) = args.next() {
                        opts.mesh_metrics = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--mesh-metrics requires a file path");
                    }
                }
                "--seed" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<i32>() {
                            Ok(value) => opts.seed = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--seed must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--seed requires an integer");
                    }
                }
                "--radius" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<i32>() {
                            Ok(value) if value >= 0 => opts.radius = Some(value),
                            Ok(value) => {
                                tracing::warn!(value, "--radius must not be negative; ignoring");
                            }
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--radius must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--radius requires an integer");
                    }
                }
                other => tracing::warn!(arg = other, "Ignoring unknown argument"),
            }
        }

        opts
    }

    /// Flags win over file values.
    fn apply(&self, cfg: &mut WorldConfig) {
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        if let Some(radius) = self.radius {
            cfg.zone_radius = radius;
        }
        if let Some(path) = &self.mesh_metrics {
            cfg.mesh_metrics = Some(path.clone());
        }
        if self.background {
            cfg.background = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "--seed",
            "-5",
            "--radius",
            "2",
            "--background",
            "--mesh-metrics",
            "out/mesh.json",
        ]);
        let mut cfg = WorldConfig {
            seed: Some(1),
            ..WorldConfig::default()
        };
        cli.apply(&mut cfg);
        assert_eq!(cfg.seed, Some(-5));
        assert_eq!(cfg.zone_radius, 2);
        assert!(cfg.background);
        assert_eq!(cfg.mesh_metrics, Some(PathBuf::from("out/mesh.json")));
    }

    #[test]
    fn bad_values_are_ignored() {
        let cli = parse(&["--seed", "north", "--radius", "-1", "--bogus", "--config"]);
        assert_eq!(cli.seed, None);
        assert_eq!(cli.radius, None);
        assert_eq!(cli.config, None);

        let mut cfg = WorldConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg, WorldConfig::default());
    }
}
