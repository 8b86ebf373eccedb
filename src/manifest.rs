//! Per-input dataset manifests.
//!
//! A manifest pins down exactly which bytes an analysis run saw: content hash,
//! row counts, generation range, and anything suspicious found while loading.
//! Generations are assumed non-decreasing but never enforced; the manifest
//! records violations instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::ingest::RunData;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub bad_cells: u64,
    pub generation_min: Option<i64>,
    pub generation_max: Option<i64>,
    pub meta: BTreeMap<String, String>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn build_manifest(path: &Path, data: &RunData, now_ts: u64) -> Result<RunManifest> {
    let hash = file_sha256(path)?;

    let mut warnings = Vec::new();
    if data.bad_cells > 0 {
        warnings.push(format!("bad_cells: {}", data.bad_cells));
    }
    let mut gen_min: Option<i64> = None;
    let mut gen_max: Option<i64> = None;
    let mut prev: Option<f64> = None;
    for row in &data.rows {
        if let Some(g) = row.generation {
            let gi = g as i64;
            gen_min = Some(gen_min.map_or(gi, |v| v.min(gi)));
            gen_max = Some(gen_max.map_or(gi, |v| v.max(gi)));
            if let Some(p) = prev {
                if g < p {
                    warnings.push(format!("non_monotonic_generation: prev={} current={}", p, g));
                }
            }
            prev = Some(g);
        }
    }

    Ok(RunManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        row_count: data.rows.len() as u64,
        bad_cells: data.bad_cells,
        generation_min: gen_min,
        generation_max: gen_max,
        meta: data.meta.clone(),
        warnings,
        generated_at_epoch: now_ts,
    })
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("run.csv");
    let mut p = dataset_path.to_path_buf();
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}
