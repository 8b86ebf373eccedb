//! Batch analysis and plotting for evolution-simulator run CSVs.
//!
//! Each input file holds one simulation run: one row per generation with
//! environment id, mutation count, birth/death ratio, fitness, and optional
//! delta-fitness statistics. The pipeline renders per-run charts, detects
//! environment segments with their boundary snapshots, and writes two
//! cross-run tables.

pub mod config;
pub mod ingest;
pub mod logging;
pub mod manifest;
pub mod plot;
pub mod report;
pub mod segments;
pub mod stats;
pub mod summary;
