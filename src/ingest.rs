//! CSV loading for simulator run files.
//!
//! The simulator writes one row per generation. The header line carries a
//! trailing metadata token (`SEED:<value>` from older runs, `# ARGS key=value ...`
//! from newer ones); the first five columns are positional regardless of what
//! the header calls them. Extra delta-fitness columns are recognized by name.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const STD_COLUMNS: [&str; 5] = ["Generation", "Environment", "Mutated", "B/D Ratio", "Fitness"];

pub const DELTA_COLUMNS: [&str; 3] = ["Δfit+ mean", "Δfit- mean", "Δfit net mean"];

/// One data row, all fields already numeric-coerced.
#[derive(Debug, Clone, Default)]
pub struct RunRow {
    pub generation: Option<f64>,
    pub environment: Option<f64>,
    pub mutated: Option<f64>,
    pub bd_ratio: Option<f64>,
    pub fitness: Option<f64>,
    pub delta_plus: Option<f64>,
    pub delta_minus: Option<f64>,
    pub delta_net: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RunData {
    pub rows: Vec<RunRow>,
    pub meta: BTreeMap<String, String>,
    /// Presence flags for the three recognized delta columns, in DELTA_COLUMNS order.
    pub delta_present: [bool; 3],
    /// Non-empty cells in recognized numeric columns that failed to parse.
    pub bad_cells: u64,
}

impl RunData {
    pub fn has_delta(&self) -> bool {
        self.delta_present.iter().any(|p| *p)
    }
}

/// Parse the metadata token from a raw header line.
///
/// Only the last comma-separated token is inspected; everything else on the
/// line is column names.
pub fn parse_header_meta(header_line: &str) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    let last = match header_line.split(',').next_back() {
        Some(t) => t.trim(),
        None => return meta,
    };
    if let Some(seed) = last.strip_prefix("SEED:") {
        meta.insert("seed".to_string(), seed.trim().to_string());
    } else if let Some(args) = last.strip_prefix("# ARGS") {
        for kv in args.split_whitespace() {
            if let Some((k, v)) = kv.split_once('=') {
                meta.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
    }
    meta
}

/// Coerce one cell to a float. Blank, unparseable, and literal NaN cells are
/// all treated as missing; ±Inf survives as an infinite value.
fn coerce(cell: &str, bad_cells: &mut u64) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => {
            *bad_cells += 1;
            None
        }
    }
}

pub fn load_run_csv(path: &Path) -> Result<RunData> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = match lines.next() {
        Some(line) => line.with_context(|| format!("read header of {}", path.display()))?,
        None => {
            return Ok(RunData {
                rows: Vec::new(),
                meta: BTreeMap::new(),
                delta_present: [false; 3],
                bad_cells: 0,
            })
        }
    };
    let meta = parse_header_meta(&header_line);

    // Column indices for the recognized delta columns; the first five columns
    // are positional and never matched by name.
    let header_cols: Vec<String> = header_line.split(',').map(|s| s.trim().to_string()).collect();
    let mut delta_idx: [Option<usize>; 3] = [None; 3];
    for (i, name) in header_cols.iter().enumerate().skip(STD_COLUMNS.len()) {
        for (k, delta_name) in DELTA_COLUMNS.iter().enumerate() {
            if name == delta_name {
                delta_idx[k] = Some(i);
            }
        }
    }

    let mut rows = Vec::new();
    let mut bad_cells = 0u64;
    for line in lines {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let cell = |i: usize, bad: &mut u64| fields.get(i).and_then(|c| coerce(c, bad));

        let mut row = RunRow {
            generation: cell(0, &mut bad_cells),
            environment: cell(1, &mut bad_cells),
            mutated: cell(2, &mut bad_cells),
            bd_ratio: cell(3, &mut bad_cells),
            fitness: cell(4, &mut bad_cells),
            ..RunRow::default()
        };
        if let Some(i) = delta_idx[0] {
            row.delta_plus = cell(i, &mut bad_cells);
        }
        if let Some(i) = delta_idx[1] {
            row.delta_minus = cell(i, &mut bad_cells);
        }
        if let Some(i) = delta_idx[2] {
            row.delta_net = cell(i, &mut bad_cells);
        }
        rows.push(row);
    }

    Ok(RunData {
        rows,
        meta,
        delta_present: [
            delta_idx[0].is_some(),
            delta_idx[1].is_some(),
            delta_idx[2].is_some(),
        ],
        bad_cells,
    })
}
