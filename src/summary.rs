//! Cross-run tables: one descriptive-statistics row per input file, the flat
//! boundary-snapshot table, and the per-environment statistics table. Column
//! names and order match what downstream notebooks already consume.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ingest::RunData;
use crate::segments::BoundarySnapshot;
use crate::stats;

pub const SUMMARY_COLUMNS: [&str; 22] = [
    "file",
    "seed",
    "envs",
    "iterations",
    "mutability",
    "neutral-range",
    "max-fitness",
    "loci",
    "startorgs",
    "maxorgs",
    "rows",
    "fitness_mean",
    "fitness_std",
    "fitness_min",
    "fitness_max",
    "fitness_nan_count",
    "bd_mean",
    "bd_median",
    "bd_inf_count",
    "mutated_mean",
    "mutated_median",
    "mutated_max",
];

pub const EDGE_COLUMNS: [&str; 7] = [
    "file",
    "Environment",
    "Tag",
    "Generation",
    "Mutated",
    "B/D Ratio",
    "Fitness",
];

pub const ENV_STATS_COLUMNS: [&str; 12] = [
    "file",
    "avg_bd",
    "avg_fitness",
    "bd_jump",
    "diff_bd",
    "env",
    "final_bd",
    "initial_bd",
    "max_bd",
    "min_bd",
    "num_gens",
    "seed",
];

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub file: String,
    pub seed: Option<String>,
    pub envs: Option<String>,
    pub iterations: Option<String>,
    pub mutability: Option<String>,
    pub neutral_range: Option<String>,
    pub max_fitness: Option<String>,
    pub loci: Option<String>,
    pub startorgs: Option<String>,
    pub maxorgs: Option<String>,
    pub rows: u64,
    pub fitness_mean: Option<f64>,
    pub fitness_std: Option<f64>,
    pub fitness_min: Option<f64>,
    pub fitness_max: Option<f64>,
    pub fitness_nan_count: u64,
    pub bd_mean: Option<f64>,
    pub bd_median: Option<f64>,
    pub bd_inf_count: u64,
    pub mutated_mean: Option<f64>,
    pub mutated_median: Option<f64>,
    pub mutated_max: Option<f64>,
}

pub fn summarize_run(file: &str, data: &RunData) -> SummaryRow {
    let meta = |key: &str| data.meta.get(key).cloned();

    let fitness: Vec<Option<f64>> = data.rows.iter().map(|r| r.fitness).collect();
    let mutated: Vec<Option<f64>> = data.rows.iter().map(|r| r.mutated).collect();
    let bd: Vec<Option<f64>> = data
        .rows
        .iter()
        .map(|r| r.bd_ratio.map(stats::desentinel))
        .collect();

    let fitness_finite = stats::finite_sorted(&fitness);
    let mutated_finite = stats::finite_sorted(&mutated);
    let bd_finite = stats::finite_sorted(&bd);
    let bd_inf_count = bd
        .iter()
        .filter(|v| v.map(f64::is_infinite).unwrap_or(false))
        .count() as u64;
    let fitness_nan_count = fitness.iter().filter(|v| v.is_none()).count() as u64;

    SummaryRow {
        file: file.to_string(),
        seed: meta("seed"),
        envs: meta("envs"),
        iterations: meta("iterations"),
        mutability: meta("mutability"),
        neutral_range: meta("neutral-range"),
        max_fitness: meta("max-fitness"),
        loci: meta("loci"),
        startorgs: meta("startorgs"),
        maxorgs: meta("maxorgs"),
        rows: data.rows.len() as u64,
        fitness_mean: stats::mean(&fitness_finite),
        fitness_std: stats::sample_std(&fitness_finite),
        fitness_min: stats::min(&fitness_finite),
        fitness_max: stats::max(&fitness_finite),
        fitness_nan_count,
        bd_mean: stats::mean(&bd_finite),
        bd_median: stats::median(&bd_finite),
        bd_inf_count,
        mutated_mean: stats::mean(&mutated_finite),
        mutated_median: stats::median(&mutated_finite),
        mutated_max: stats::max(&mutated_finite),
    }
}

/// Per-environment statistics for one run. Rows are grouped by the raw
/// environment id (no forward-fill, re-visits accumulate into the same
/// bucket); B/D values that are non-finite after sentinel mapping are skipped
/// the same way missing ones are.
#[derive(Debug, Clone, Serialize)]
pub struct EnvStats {
    pub env: i64,
    pub seed: Option<String>,
    pub initial_bd: Option<f64>,
    pub final_bd: Option<f64>,
    pub min_bd: Option<f64>,
    pub max_bd: Option<f64>,
    /// Sum of usable B/D values divided by num_gens, the total row count for
    /// the environment. Rows with a missing ratio still count in the divisor.
    pub avg_bd: f64,
    /// Same divisor convention as avg_bd.
    pub avg_fitness: f64,
    pub num_gens: u64,
    /// final_bd - initial_bd, when both exist.
    pub diff_bd: Option<f64>,
    /// This environment's initial_bd minus the previous (by env id) one's
    /// final_bd; the first environment has none.
    pub bd_jump: Option<f64>,
}

pub fn env_stats(data: &RunData) -> Vec<EnvStats> {
    let seed = data.meta.get("seed").cloned();
    let mut buckets: Vec<EnvStats> = Vec::new();

    for row in &data.rows {
        let env = match row.environment {
            Some(e) => e as i64,
            None => continue,
        };
        let idx = match buckets.iter().position(|s| s.env == env) {
            Some(i) => i,
            None => {
                buckets.push(EnvStats {
                    env,
                    seed: seed.clone(),
                    initial_bd: None,
                    final_bd: None,
                    min_bd: None,
                    max_bd: None,
                    avg_bd: 0.0,
                    avg_fitness: 0.0,
                    num_gens: 0,
                    diff_bd: None,
                    bd_jump: None,
                });
                buckets.len() - 1
            }
        };
        let entry = &mut buckets[idx];

        if let Some(bd) = row.bd_ratio.map(stats::desentinel).filter(|v| v.is_finite()) {
            entry.initial_bd.get_or_insert(bd);
            entry.final_bd = Some(bd);
            entry.min_bd = Some(entry.min_bd.map_or(bd, |m| m.min(bd)));
            entry.max_bd = Some(entry.max_bd.map_or(bd, |m| m.max(bd)));
            entry.avg_bd += bd;
        }
        if let Some(fit) = row.fitness.filter(|v| !v.is_nan()) {
            entry.avg_fitness += fit;
        }
        entry.num_gens += 1;
    }

    for entry in &mut buckets {
        if entry.num_gens > 0 {
            entry.avg_bd /= entry.num_gens as f64;
            entry.avg_fitness /= entry.num_gens as f64;
        }
        entry.diff_bd = match (entry.initial_bd, entry.final_bd) {
            (Some(i), Some(f)) => Some(f - i),
            _ => None,
        };
    }

    buckets.sort_by_key(|s| s.env);
    for i in 1..buckets.len() {
        if let (Some(initial), Some(prev_final)) = (buckets[i].initial_bd, buckets[i - 1].final_bd) {
            buckets[i].bd_jump = Some(initial - prev_final);
        }
    }
    buckets
}

/// Quote a cell if it would break the row apart.
fn csv_cell(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn fmt_opt_f64(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn fmt_opt_str(v: &Option<String>) -> String {
    v.as_deref().map(csv_cell).unwrap_or_default()
}

/// The per-environment table writes N/A for an undefined delta, matching what
/// its consumers already expect.
fn fmt_opt_f64_na(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", SUMMARY_COLUMNS.join(","))?;
    for r in rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_cell(&r.file),
            fmt_opt_str(&r.seed),
            fmt_opt_str(&r.envs),
            fmt_opt_str(&r.iterations),
            fmt_opt_str(&r.mutability),
            fmt_opt_str(&r.neutral_range),
            fmt_opt_str(&r.max_fitness),
            fmt_opt_str(&r.loci),
            fmt_opt_str(&r.startorgs),
            fmt_opt_str(&r.maxorgs),
            r.rows,
            fmt_opt_f64(r.fitness_mean),
            fmt_opt_f64(r.fitness_std),
            fmt_opt_f64(r.fitness_min),
            fmt_opt_f64(r.fitness_max),
            r.fitness_nan_count,
            fmt_opt_f64(r.bd_mean),
            fmt_opt_f64(r.bd_median),
            r.bd_inf_count,
            fmt_opt_f64(r.mutated_mean),
            fmt_opt_f64(r.mutated_median),
            fmt_opt_f64(r.mutated_max),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write the boundary-snapshot table. The header goes out even when no
/// snapshot was produced by any input.
pub fn write_edges_csv(path: &Path, snaps: &[(String, BoundarySnapshot)]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", EDGE_COLUMNS.join(","))?;
    for (fname, s) in snaps {
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            csv_cell(fname),
            s.environment,
            s.tag.as_str(),
            s.generation,
            fmt_opt_f64(s.mutated),
            fmt_opt_f64(s.bd_ratio),
            fmt_opt_f64(s.fitness),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write the per-environment statistics table, one row per (file, env id).
pub fn write_env_stats_csv(path: &Path, rows: &[(String, EnvStats)]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", ENV_STATS_COLUMNS.join(","))?;
    for (fname, s) in rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_cell(fname),
            s.avg_bd,
            s.avg_fitness,
            fmt_opt_f64_na(s.bd_jump),
            fmt_opt_f64_na(s.diff_bd),
            s.env,
            fmt_opt_f64(s.final_bd),
            fmt_opt_f64(s.initial_bd),
            fmt_opt_f64(s.max_bd),
            fmt_opt_f64(s.min_bd),
            s.num_gens,
            fmt_opt_str(&s.seed),
        )?;
    }
    out.flush()?;
    Ok(())
}
