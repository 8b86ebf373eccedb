use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use evoplot::ingest::load_run_csv;
use evoplot::manifest::{build_manifest, default_manifest_path};

fn main() {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/csv/run.csv"));

    let now_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let data = match load_run_csv(&path) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("load failed: {}", err);
            std::process::exit(1);
        }
    };

    let manifest = match build_manifest(&path, &data, now_ts) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("manifest failed: {}", err);
            std::process::exit(2);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = match serde_json::to_string_pretty(&manifest) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("serialize failed: {}", err);
            std::process::exit(3);
        }
    };
    if let Err(err) = fs::write(&out_path, payload) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}
