//! Per-run PNG charts.
//!
//! One chart per metric, generation on the x axis. Missing values split the
//! line into disjoint polylines instead of bridging the gap.

use anyhow::Result;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::ingest::{RunData, DELTA_COLUMNS};
use crate::stats;

const CHART_SIZE: (u32, u32) = (1200, 700);

/// Contiguous finite (x, y) runs; a missing or non-finite value on either
/// side ends the current polyline.
pub fn polylines(xs: &[Option<f64>], ys: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut lines = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for i in 0..xs.len().min(ys.len()) {
        match (xs[i], ys[i]) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => current.push((x, y)),
            _ => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn bounds(lines: &[Vec<(f64, f64)>]) -> Option<(f64, f64, f64, f64)> {
    let mut it = lines.iter().flatten();
    let first = *it.next()?;
    let mut b = (first.0, first.0, first.1, first.1);
    for &(x, y) in lines.iter().flatten() {
        b.0 = b.0.min(x);
        b.1 = b.1.max(x);
        b.2 = b.2.min(y);
        b.3 = b.3.max(y);
    }
    Some(b)
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}

fn line_chart(path: &Path, title: &str, y_desc: &str, lines: &[Vec<(f64, f64)>]) -> Result<()> {
    let (x_lo, x_hi, y_lo, y_hi) = match bounds(lines) {
        Some(b) => b,
        None => return Ok(()),
    };
    let (x_lo, x_hi) = padded(x_lo, x_hi);
    let (y_lo, y_hi) = padded(y_lo, y_hi);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_desc("Generation")
        .y_desc(y_desc)
        .draw()?;
    for line in lines {
        chart.draw_series(LineSeries::new(line.iter().copied(), &BLUE))?;
    }
    root.present()?;
    Ok(())
}

fn multi_line_chart(
    path: &Path,
    title: &str,
    y_desc: &str,
    series: &[(&str, Vec<Vec<(f64, f64)>>)],
) -> Result<()> {
    let all: Vec<Vec<(f64, f64)>> = series.iter().flat_map(|(_, l)| l.clone()).collect();
    let (x_lo, x_hi, y_lo, y_hi) = match bounds(&all) {
        Some(b) => b,
        None => return Ok(()),
    };
    let (x_lo, x_hi) = padded(x_lo, x_hi);
    let (y_lo, y_hi) = padded(y_lo, y_hi);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_desc("Generation")
        .y_desc(y_desc)
        .draw()?;

    let palette: [&'static RGBColor; 3] = [&BLUE, &RED, &GREEN];
    for (i, (name, lines)) in series.iter().enumerate() {
        let color = palette[i % palette.len()];
        for (j, line) in lines.iter().enumerate() {
            let drawn = chart.draw_series(LineSeries::new(line.iter().copied(), color))?;
            if j == 0 {
                drawn
                    .label(*name)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], *color));
            }
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Render every chart for one input file; returns the paths written.
pub fn render_run_plots(
    png_dir: &Path,
    fname: &str,
    data: &RunData,
    clip_quantile: f64,
) -> Result<Vec<PathBuf>> {
    let base = Path::new(fname)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fname.to_string());
    let mut written = Vec::new();

    let xs: Vec<Option<f64>> = data.rows.iter().map(|r| r.generation).collect();

    let fitness: Vec<Option<f64>> = data.rows.iter().map(|r| r.fitness).collect();
    let lines = polylines(&xs, &fitness);
    if !lines.is_empty() {
        let path = png_dir.join(format!("{base}_fitness.png"));
        line_chart(&path, &format!("{fname}: Fitness vs Generation"), "Fitness", &lines)?;
        written.push(path);
    }

    let bd: Vec<Option<f64>> = data.rows.iter().map(|r| r.bd_ratio).collect();
    let clipped = stats::clip_ratio_series(&bd, clip_quantile);
    let lines = polylines(&xs, &clipped);
    if !lines.is_empty() {
        let path = png_dir.join(format!("{base}_bd_ratio.png"));
        let pct = clip_quantile * 100.0;
        line_chart(
            &path,
            &format!("{fname}: B/D Ratio vs Generation (clipped {pct:.0}%)"),
            "B/D Ratio",
            &lines,
        )?;
        written.push(path);
    }

    let mutated: Vec<Option<f64>> = data.rows.iter().map(|r| r.mutated).collect();
    let lines = polylines(&xs, &mutated);
    if !lines.is_empty() {
        let path = png_dir.join(format!("{base}_mutated.png"));
        line_chart(
            &path,
            &format!("{fname}: Mutated Count vs Generation"),
            "# Mutated",
            &lines,
        )?;
        written.push(path);
    }

    if data.has_delta() {
        let columns: [Vec<Option<f64>>; 3] = [
            data.rows.iter().map(|r| r.delta_plus).collect(),
            data.rows.iter().map(|r| r.delta_minus).collect(),
            data.rows.iter().map(|r| r.delta_net).collect(),
        ];
        let mut series: Vec<(&str, Vec<Vec<(f64, f64)>>)> = Vec::new();
        for (i, col) in columns.iter().enumerate() {
            if data.delta_present[i] {
                series.push((DELTA_COLUMNS[i], polylines(&xs, col)));
            }
        }
        if series.iter().any(|(_, l)| !l.is_empty()) {
            let path = png_dir.join(format!("{base}_delta_means.png"));
            multi_line_chart(
                &path,
                &format!("{fname}: Mean Δfitness (per generation)"),
                "Mean Δfitness",
                &series,
            )?;
            written.push(path);
        }
    }

    Ok(written)
}
