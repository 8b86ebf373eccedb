use anyhow::Result;
use std::env;
use std::path::PathBuf;

use evoplot::config::Config;
use evoplot::logging::{json_log, obj, v_num, v_str};
use evoplot::report;

fn main() -> Result<()> {
    let mut cfg = Config::from_env();
    // Positional overrides: evoplot [csv_dir] [out_dir]
    if let Some(dir) = env::args().nth(1) {
        cfg.csv_dir = PathBuf::from(dir);
    }
    if let Some(dir) = env::args().nth(2) {
        cfg.out_dir = PathBuf::from(dir);
    }

    json_log(
        "main",
        obj(&[
            ("csv_dir", v_str(&cfg.csv_dir.display().to_string())),
            ("out_dir", v_str(&cfg.out_dir.display().to_string())),
            ("clip_quantile", v_num(cfg.clip_quantile)),
        ]),
    );

    let outcome = report::run_batch(&cfg)?;
    println!(
        "WROTE {} {} {} {}",
        outcome.summary_path.display(),
        outcome.edges_path.display(),
        outcome.env_stats_path.display(),
        cfg.png_dir().display()
    );
    Ok(())
}
