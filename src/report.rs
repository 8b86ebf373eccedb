//! Batch driver: discover inputs, analyze each file independently, write the
//! cross-run tables last.

use anyhow::{Context, Result};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::ingest;
use crate::logging::{json_log, log, obj, v_num, v_str, Level};
use crate::plot;
use crate::segments::{self, BoundarySnapshot};
use crate::summary::{self, EnvStats, SummaryRow};

#[derive(Debug)]
pub struct BatchOutcome {
    pub summary_rows: Vec<SummaryRow>,
    pub snapshot_count: usize,
    pub chart_count: usize,
    pub summary_path: PathBuf,
    pub edges_path: PathBuf,
    pub env_stats_path: PathBuf,
}

/// Files ending in `.csv` (any case) directly under `dir`, sorted by name so
/// reruns produce identically ordered tables.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in dir.read_dir().with_context(|| format!("read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn run_batch(cfg: &Config) -> Result<BatchOutcome> {
    create_dir_all(&cfg.csv_dir)
        .with_context(|| format!("create {}", cfg.csv_dir.display()))?;
    create_dir_all(cfg.png_dir())
        .with_context(|| format!("create {}", cfg.png_dir().display()))?;

    let files = discover_csv_files(&cfg.csv_dir)?;
    let mut summary_rows = Vec::with_capacity(files.len());
    let mut edges: Vec<(String, BoundarySnapshot)> = Vec::new();
    let mut env_rows: Vec<(String, EnvStats)> = Vec::new();
    let mut chart_count = 0usize;

    for path in &files {
        let fname = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = ingest::load_run_csv(path)?;

        summary_rows.push(summary::summarize_run(&fname, &data));

        let snaps = segments::extract_segments(&data.rows);
        let snap_count = snaps.len();
        edges.extend(snaps.into_iter().map(|s| (fname.clone(), s)));

        env_rows.extend(
            summary::env_stats(&data)
                .into_iter()
                .map(|s| (fname.clone(), s)),
        );

        // A failed render keeps the tables intact; the chart is what's lost.
        match plot::render_run_plots(&cfg.png_dir(), &fname, &data, cfg.clip_quantile) {
            Ok(written) => chart_count += written.len(),
            Err(err) => log(
                Level::Warn,
                "plot",
                obj(&[("file", v_str(&fname)), ("error", v_str(&err.to_string()))]),
            ),
        }

        json_log(
            "report",
            obj(&[
                ("file", v_str(&fname)),
                ("rows", v_num(data.rows.len() as f64)),
                ("bad_cells", v_num(data.bad_cells as f64)),
                ("snapshots", v_num(snap_count as f64)),
            ]),
        );
    }

    let summary_path = cfg.summary_path();
    let edges_path = cfg.edges_path();
    let env_stats_path = cfg.env_stats_path();
    summary::write_summary_csv(&summary_path, &summary_rows)?;
    summary::write_edges_csv(&edges_path, &edges)?;
    summary::write_env_stats_csv(&env_stats_path, &env_rows)?;

    json_log(
        "report",
        obj(&[
            ("files", v_num(files.len() as f64)),
            ("snapshots", v_num(edges.len() as f64)),
            ("charts", v_num(chart_count as f64)),
            ("summary", v_str(&summary_path.display().to_string())),
            ("edges", v_str(&edges_path.display().to_string())),
            ("env_stats", v_str(&env_stats_path.display().to_string())),
        ]),
    );

    Ok(BatchOutcome {
        summary_rows,
        snapshot_count: edges.len(),
        chart_count,
        summary_path,
        edges_path,
        env_stats_path,
    })
}
