//! fillrankingdb - aggregate dated ranking snapshots into the rankings table
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin fillrankingdb -- rankings/ [--week-day SUN]
//!     [--types bgg r_g ...] [--min-date 2020-01-01] [--max-date ...] [--dry-run]
//! ```
//!
//! `rankings/` holds one sub-directory per ranking type (`bgg`, `r_g`,
//! `factor`, `similarity`, `charts`).

use chrono::NaiveDate;
use ludoj::config::{parse_ranking_types, RankingConfig};
use ludoj::dates::parse_datetime;
use ludoj::pipeline::run_rankings;
use ludoj::ranking_core::{parse_week_day, AggregatorOptions};
use ludoj::store::SqliteStore;
use std::env;
use std::path::PathBuf;

fn parse_date_arg(value: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    parse_datetime(value)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| format!("{} is not a date", value).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let mut config = RankingConfig::from_env()?;
    let mut options = AggregatorOptions::default();
    let mut root: Option<PathBuf> = None;
    let mut types: Option<String> = None;

    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dry-run" | "-n" => config.dry_run = true,
            "--week-day" | "-w" => {
                let value = args.next().ok_or("--week-day needs a value")?;
                config.week_day =
                    parse_week_day(&value).ok_or_else(|| format!("unknown week day {}", value))?;
            }
            "--types" | "-t" => {
                // all following values up to the next flag
                let mut codes = Vec::new();
                while let Some(code) = args.next_if(|next| !next.starts_with('-')) {
                    codes.push(code);
                }
                types = Some(codes.join(","));
            }
            "--min-date" => options.min_date = Some(parse_date_arg(&args.next().ok_or("--min-date needs a value")?)?),
            "--max-date" => options.max_date = Some(parse_date_arg(&args.next().ok_or("--max-date needs a value")?)?),
            flag if flag.starts_with('-') => return Err(format!("unknown flag {}", flag).into()),
            path => root = Some(PathBuf::from(path)),
        }
    }

    if let Some(codes) = types {
        config.types = parse_ranking_types(&codes)?;
    }
    options.anchor = config.week_day;
    let root = root.ok_or("no input directory given")?;

    log::info!("🚀 Starting fillrankingdb");
    log::info!("   Input: {}", root.display());
    log::info!("   Database: {}", config.db_path.display());
    log::info!("   Week day: {}", config.week_day);
    log::info!(
        "   Types: {}",
        config.types.iter().map(|t| t.code()).collect::<Vec<_>>().join(", ")
    );

    let mut store = SqliteStore::open(&config.db_path)?;
    run_rankings(
        &mut store,
        &root,
        &config.types,
        &options,
        config.batch_size,
        config.dry_run,
    )?;

    log::info!("✅ Done filling rankings");
    Ok(())
}
