//! filldb - load scraped board game data into SQLite
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin filldb -- games.jl [more.jl ...] [--dry-run] [--clear]
//!     [--batch N] [--in-format jl] [--collection collections.jl] [--users users.jl]
//!     [--links links.json] [--rankings rankings/r_g] [--clusters clusters.json]
//! ```
//!
//! Flags override the matching environment variables (see `LoadConfig`).

use ludoj::config::LoadConfig;
use ludoj::pipeline::run_filldb;
use ludoj::recommender::FileRecommender;
use ludoj::source::SourceFormat;
use ludoj::store::SqliteStore;
use std::env;
use std::path::PathBuf;

const VALUE_FLAGS: [&str; 7] = [
    "--batch",
    "--in-format",
    "--collection",
    "--users",
    "--links",
    "--rankings",
    "--clusters",
];

struct Args {
    paths: Vec<PathBuf>,
    flags: Vec<(String, String)>,
    dry_run: bool,
    clear: bool,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut args = Args {
        paths: Vec::new(),
        flags: Vec::new(),
        dry_run: false,
        clear: false,
    };

    let mut raw = env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--dry-run" | "-n" => args.dry_run = true,
            "--clear" => args.clear = true,
            flag if VALUE_FLAGS.contains(&flag) => {
                let value = raw.next().ok_or_else(|| format!("{} needs a value", flag))?;
                args.flags.push((flag.to_string(), value));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag).into()),
            path => args.paths.push(PathBuf::from(path)),
        }
    }
    Ok(args)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args = parse_args()?;
    if args.paths.is_empty() {
        return Err("no game files given".into());
    }

    let mut config = LoadConfig::from_env()?;
    config.dry_run |= args.dry_run;
    for (flag, value) in &args.flags {
        match flag.as_str() {
            "--batch" => config.batch_size = value.parse()?,
            "--in-format" => {
                config.in_format = Some(
                    SourceFormat::from_str(value).ok_or_else(|| format!("unknown format {}", value))?,
                )
            }
            "--collection" => config.collection_paths.push(value.into()),
            "--users" => config.user_paths.push(value.into()),
            "--links" => config.links_path = Some(value.into()),
            "--rankings" => config.recommender_rankings_dir = Some(value.into()),
            "--clusters" => config.recommender_clusters_path = Some(value.into()),
            _ => {}
        }
    }
    config.validate()?;

    log::info!("🚀 Starting filldb");
    log::info!("   Database: {}", config.db_path.display());
    log::info!("   Game files: {}", args.paths.len());
    log::info!("   Batch size: {}", config.batch_size);
    if config.dry_run {
        log::info!("   Dry run: nothing will be written");
    }

    let mut store = SqliteStore::open(&config.db_path)?;
    if args.clear && !config.dry_run {
        log::info!("🗑️  Clearing existing data");
        store.clear()?;
    }

    let recommender = FileRecommender::new(
        config.recommender_rankings_dir.clone(),
        config.recommender_clusters_path.clone(),
    )
    .with_star_percentiles(config.star_percentiles.clone());

    run_filldb(&mut store, &config, &args.paths, &recommender)?;

    log::info!("✅ Done filling the database");
    Ok(())
}
