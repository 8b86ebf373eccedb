//! Runtime configuration, environment-driven with sensible defaults.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for `*.csv` inputs.
    pub csv_dir: PathBuf,
    /// Directory receiving `summary.csv`, `env_edges.csv`, `env_stats.csv`
    /// and the `png/` tree.
    pub out_dir: PathBuf,
    /// Quantile used to cap the B/D ratio for plotting.
    pub clip_quantile: f64,
}

impl Config {
    pub fn from_env() -> Self {
        let csv_dir = std::env::var("CSV_DIR").unwrap_or_else(|_| "data/csv".to_string());
        let out_dir = std::env::var("OUT_DIR").unwrap_or_else(|_| "data".to_string());
        let clip_quantile = std::env::var("CLIP_QUANTILE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.99)
            .clamp(0.0, 1.0);
        Self {
            csv_dir: PathBuf::from(csv_dir),
            out_dir: PathBuf::from(out_dir),
            clip_quantile,
        }
    }

    pub fn png_dir(&self) -> PathBuf {
        self.out_dir.join("png")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.out_dir.join("summary.csv")
    }

    pub fn edges_path(&self) -> PathBuf {
        self.out_dir.join("env_edges.csv")
    }

    pub fn env_stats_path(&self) -> PathBuf {
        self.out_dir.join("env_stats.csv")
    }
}
