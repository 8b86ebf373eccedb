use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use evoplot::config::Config;
use evoplot::report::run_batch;

fn write_csv(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let mut out = String::new();
    out.push_str(header);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, out).unwrap();
    path
}

fn cfg_for(dir: &TempDir) -> Config {
    Config {
        csv_dir: dir.path().join("csv"),
        out_dir: dir.path().join("out"),
        clip_quantile: 0.99,
    }
}

#[test]
fn summary_extremes_match_monotone_fitness_run() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    let rows: Vec<String> = (0..10)
        .map(|i| format!("{},1,2,0.5,{}", i, 0.1 + i as f64 * 0.05))
        .collect();
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    write_csv(
        &cfg.csv_dir,
        "run.csv",
        "Generation,Environment,Mutated,B/D Ratio,Fitness,# ARGS seed=42 loci=10",
        &row_refs,
    );

    let outcome = run_batch(&cfg).unwrap();
    assert_eq!(outcome.summary_rows.len(), 1);
    let row = &outcome.summary_rows[0];
    assert_eq!(row.rows, 10);
    assert_eq!(row.fitness_min, Some(0.1));
    assert!((row.fitness_max.unwrap() - 0.55).abs() < 1e-12);
    assert_eq!(row.seed.as_deref(), Some("42"));
    assert_eq!(row.loci.as_deref(), Some("10"));

    // One environment, one segment: first two begin + last two end.
    assert_eq!(outcome.snapshot_count, 4);

    let edges = fs::read_to_string(&outcome.edges_path).unwrap();
    let lines: Vec<&str> = edges.lines().collect();
    assert_eq!(lines[0], "file,Environment,Tag,Generation,Mutated,B/D Ratio,Fitness");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("run.csv,1,begin,0,"));
    assert!(lines[4].starts_with("run.csv,1,end,9,"));
}

#[test]
fn sentinel_ratio_is_counted_not_averaged() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    write_csv(
        &cfg.csv_dir,
        "run.csv",
        "Generation,Environment,Mutated,B/D Ratio,Fitness,SEED:1",
        &[
            "0,1,2,1.0,0.5",
            "1,1,2,3.0,0.5",
            "2,1,2,1000000000,0.5",
        ],
    );

    let outcome = run_batch(&cfg).unwrap();
    let row = &outcome.summary_rows[0];
    assert_eq!(row.bd_mean, Some(2.0));
    assert_eq!(row.bd_median, Some(2.0));
    assert_eq!(row.bd_inf_count, 1);
}

#[test]
fn file_without_usable_rows_still_gets_summary_row() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    write_csv(
        &cfg.csv_dir,
        "empty.csv",
        "Generation,Environment,Mutated,B/D Ratio,Fitness,SEED:3",
        &[",,bad,,", ",,,,"],
    );

    let outcome = run_batch(&cfg).unwrap();
    assert_eq!(outcome.summary_rows.len(), 1);
    assert_eq!(outcome.summary_rows[0].rows, 2);
    assert_eq!(outcome.snapshot_count, 0);

    // Edges table still written, header only.
    let edges = fs::read_to_string(&outcome.edges_path).unwrap();
    assert_eq!(edges.lines().count(), 1);
}

#[test]
fn environment_switches_produce_segment_snapshots() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    write_csv(
        &cfg.csv_dir,
        "envs.csv",
        "Generation,Environment,Mutated,B/D Ratio,Fitness,SEED:1",
        &[
            "0,1,2,0.5,0.1",
            "1,1,2,0.5,0.2",
            "2,2,2,0.5,0.3",
            "3,2,2,0.5,0.4",
            "4,2,2,0.5,0.5",
            "5,3,2,0.5,0.6",
            "6,3,2,0.5,0.7",
        ],
    );

    let outcome = run_batch(&cfg).unwrap();
    // Three segments, each contributing up to 2 begin + 2 end rows.
    assert_eq!(outcome.snapshot_count, 12);
    let edges = fs::read_to_string(&outcome.edges_path).unwrap();
    assert!(edges.contains("envs.csv,2,begin,2,"));
    assert!(edges.contains("envs.csv,3,end,6,"));
}

#[test]
fn env_stats_table_tracks_per_environment_ratios() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    write_csv(
        &cfg.csv_dir,
        "run.csv",
        "Generation,Environment,Mutated,B/D Ratio,Fitness,SEED:7",
        &[
            "0,1,2,1.0,0.5",
            "1,1,2,2.0,0.5",
            "2,2,2,4.0,0.5",
            "3,2,2,6.0,0.5",
        ],
    );

    let outcome = run_batch(&cfg).unwrap();
    let content = fs::read_to_string(&outcome.env_stats_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "file,avg_bd,avg_fitness,bd_jump,diff_bd,env,final_bd,initial_bd,max_bd,min_bd,num_gens,seed"
    );
    assert_eq!(lines.len(), 3);
    // First environment has no predecessor to jump from.
    assert_eq!(lines[1], "run.csv,1.5,0.5,N/A,1,1,2,1,2,1,2,7");
    // env 2 starts at 4 after env 1 ended at 2.
    assert_eq!(lines[2], "run.csv,5,0.5,2,2,2,6,4,6,4,2,7");
}

#[test]
fn blocked_chart_output_still_yields_all_tables() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    write_csv(
        &cfg.csv_dir,
        "run.csv",
        "Generation,Environment,Mutated,B/D Ratio,Fitness,SEED:1",
        &["0,1,2,0.5,0.1", "1,1,2,0.5,0.2"],
    );
    // A directory squatting on the chart path makes the render fail.
    fs::create_dir_all(cfg.png_dir().join("run_fitness.png")).unwrap();

    let outcome = run_batch(&cfg).unwrap();
    assert_eq!(outcome.chart_count, 0);
    assert_eq!(outcome.summary_rows.len(), 1);
    assert_eq!(outcome.snapshot_count, 4);
    let summary = fs::read_to_string(&outcome.summary_path).unwrap();
    assert_eq!(summary.lines().count(), 2);
    let edges = fs::read_to_string(&outcome.edges_path).unwrap();
    assert_eq!(edges.lines().count(), 5);
    let env_stats = fs::read_to_string(&outcome.env_stats_path).unwrap();
    assert_eq!(env_stats.lines().count(), 2);
}

#[test]
fn summary_orders_files_by_name() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);
    fs::create_dir_all(&cfg.csv_dir).unwrap();
    let header = "Generation,Environment,Mutated,B/D Ratio,Fitness,SEED:1";
    write_csv(&cfg.csv_dir, "b.csv", header, &["0,1,2,0.5,0.1"]);
    write_csv(&cfg.csv_dir, "a.csv", header, &["0,1,2,0.5,0.1"]);

    let outcome = run_batch(&cfg).unwrap();
    let files: Vec<&str> = outcome.summary_rows.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["a.csv", "b.csv"]);

    let summary = fs::read_to_string(&outcome.summary_path).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("a.csv,1,"));
    assert!(lines[2].starts_with("b.csv,1,"));
}

#[test]
fn empty_input_dir_writes_empty_tables() {
    let dir = TempDir::new().unwrap();
    let cfg = cfg_for(&dir);

    let outcome = run_batch(&cfg).unwrap();
    assert!(outcome.summary_rows.is_empty());
    assert_eq!(outcome.snapshot_count, 0);
    let summary = fs::read_to_string(&outcome.summary_path).unwrap();
    assert_eq!(summary.lines().count(), 1);
    let edges = fs::read_to_string(&outcome.edges_path).unwrap();
    assert_eq!(edges.lines().count(), 1);
    let env_stats = fs::read_to_string(&outcome.env_stats_path).unwrap();
    assert_eq!(env_stats.lines().count(), 1);
}
