//! Environment segmentation and boundary snapshots.
//!
//! A segment is a maximal contiguous run of rows sharing one forward-filled
//! environment id. For each segment we keep the first two and last two rows
//! that carry both an environment and a generation, tagged `begin` / `end`.

use serde::Serialize;

use crate::ingest::RunRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryTag {
    Begin,
    End,
}

impl BoundaryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryTag::Begin => "begin",
            BoundaryTag::End => "end",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundarySnapshot {
    pub environment: i64,
    pub tag: BoundaryTag,
    pub generation: i64,
    pub mutated: Option<f64>,
    pub bd_ratio: Option<f64>,
    pub fitness: Option<f64>,
}

/// Extract boundary snapshots from a row sequence.
///
/// Segmentation runs over the forward-filled environment column, so interior
/// missing values continue the current segment. A transition where either side
/// is still missing (the leading prefix before the first environment value)
/// does not start a new segment; downstream snapshot counts depend on this, so
/// it must not be "fixed".
pub fn extract_segments(rows: &[RunRow]) -> Vec<BoundarySnapshot> {
    // Rows missing both environment and generation carry nothing usable.
    let kept: Vec<&RunRow> = rows
        .iter()
        .filter(|r| r.environment.is_some() || r.generation.is_some())
        .collect();
    if kept.is_empty() {
        return Vec::new();
    }

    let mut filled: Vec<Option<i64>> = Vec::with_capacity(kept.len());
    let mut last: Option<i64> = None;
    for row in &kept {
        if let Some(env) = row.environment {
            last = Some(env as i64);
        }
        filled.push(last);
    }
    if filled.iter().all(Option::is_none) {
        return Vec::new();
    }

    let mut starts = vec![0usize];
    let mut prev = filled[0];
    for (i, cur) in filled.iter().enumerate().skip(1) {
        if let (Some(p), Some(c)) = (prev, *cur) {
            if c != p {
                starts.push(i);
            }
        }
        prev = *cur;
    }

    let mut out = Vec::new();
    for (si, &a) in starts.iter().enumerate() {
        let b = starts.get(si + 1).copied().unwrap_or(kept.len());
        // Snapshots report the row's own environment value, not the filled one.
        let block: Vec<&RunRow> = kept[a..b]
            .iter()
            .copied()
            .filter(|r| r.environment.is_some() && r.generation.is_some())
            .collect();
        if block.is_empty() {
            continue;
        }

        let head = &block[..block.len().min(2)];
        let tail = &block[block.len().saturating_sub(2)..];
        for (tag, slice) in [(BoundaryTag::Begin, head), (BoundaryTag::End, tail)] {
            for row in slice {
                out.push(snapshot(tag, row));
            }
        }
    }
    out
}

fn snapshot(tag: BoundaryTag, row: &RunRow) -> BoundarySnapshot {
    BoundarySnapshot {
        environment: row.environment.unwrap_or_default() as i64,
        tag,
        generation: row.generation.unwrap_or_default() as i64,
        mutated: row.mutated,
        bd_ratio: row.bd_ratio,
        fitness: row.fitness,
    }
}
