//! charts - generate board game charts from ratings data
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin charts -- ratings.jl [--freq week|month|year]
//!     [--out-dir charts/] [--out-file %Y%m%d-%H%M%S.csv] [--min-date ...]
//!     [--max-date ...] [--max-rows N] [--halflife DAYS] [--overwrite] [--dry-run]
//! ```

use ludoj::charts_core::Frequency;
use ludoj::config::{parse_halflife, ChartsConfig};
use ludoj::dates::parse_datetime;
use ludoj::pipeline::run_charts;
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let mut config = ChartsConfig::from_env()?;
    let mut in_file: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--overwrite" | "-W" => config.overwrite = true,
            "--dry-run" | "-n" => config.dry_run = true,
            "--freq" | "-f" => {
                let freq = value(&arg)?;
                config.freq = Frequency::from_str(&freq).ok_or_else(|| format!("unknown frequency {}", freq))?;
            }
            "--out-dir" | "-o" => config.out_dir = value(&arg)?.into(),
            "--out-file" | "-O" => config.out_file = value(&arg)?,
            "--max-rows" | "-m" => config.max_rows = Some(value(&arg)?.parse()?),
            "--halflife" | "-H" => {
                let days = value(&arg)?;
                config.halflife_days =
                    Some(parse_halflife(&days).ok_or_else(|| format!("{} is not a half-life in days", days))?);
            }
            "--min-date" | "-d" => {
                let date = value(&arg)?;
                config.min_date = Some(parse_datetime(&date).ok_or_else(|| format!("{} is not a date", date))?);
            }
            "--max-date" | "-D" => {
                let date = value(&arg)?;
                config.max_date = Some(parse_datetime(&date).ok_or_else(|| format!("{} is not a date", date))?);
            }
            flag if flag.starts_with('-') => return Err(format!("unknown flag {}", flag).into()),
            path => in_file = Some(PathBuf::from(path)),
        }
    }

    let in_file = in_file.ok_or("no ratings file given")?;

    log::info!("🚀 Starting charts");
    log::info!("   Ratings: {}", in_file.display());
    log::info!("   Frequency: {}", config.freq.as_str());
    log::info!("   Mode: {:?}", config.mode());
    log::info!("   Output: {}", config.out_dir.join(&config.out_file).display());

    run_charts(&in_file, &config)?;

    log::info!("✅ Done");
    Ok(())
}
