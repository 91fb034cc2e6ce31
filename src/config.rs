//! Configuration from environment variables
//!
//! Every binary reads its settings with `from_env()` after loading `.env`;
//! command line flags override individual fields afterwards.

use crate::charts_core::{ChartsMode, Frequency};
use crate::dates::parse_datetime;
use crate::model::RankingType;
use crate::ranking_core::parse_week_day;
use crate::recommender::STAR_PERCENTILES;
use crate::source::SourceFormat;
use chrono::{DateTime, Utc, Weekday};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "data/ludoj.db";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Variable lookup, `std::env::var` outside of tests
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(lookup: Lookup, key: &str, default: T) -> T {
    lookup(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn flag(lookup: Lookup, key: &str) -> bool {
    lookup(key).map_or(false, |s| {
        matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

fn paths(lookup: Lookup, key: &str) -> Vec<PathBuf> {
    lookup(key)
        .map(|s| {
            s.split(',')
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

fn date(lookup: Lookup, key: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => parse_datetime(&value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue(format!("{}={} is not a date", key, value))),
    }
}

/// Settings of the `filldb` loader
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub db_path: PathBuf,
    pub batch_size: usize,
    /// Source format; guessed from the file extension when unset
    pub in_format: Option<SourceFormat>,
    pub dry_run: bool,
    pub collection_paths: Vec<PathBuf>,
    pub user_paths: Vec<PathBuf>,
    pub premium_user_dirs: Vec<PathBuf>,
    pub premium_user_paths: Vec<PathBuf>,
    pub links_path: Option<PathBuf>,
    pub recommender_rankings_dir: Option<PathBuf>,
    pub recommender_clusters_path: Option<PathBuf>,
    pub star_percentiles: Vec<f64>,
}

impl LoadConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LUDOJ_DB_PATH` (default: data/ludoj.db)
    /// - `LOAD_BATCH_SIZE` (default: 100000)
    /// - `LOAD_IN_FORMAT` (json, jsonl or yaml)
    /// - `LOAD_DRY_RUN` (default: false)
    /// - `COLLECTION_PATHS`, `USER_PATHS` (comma-separated)
    /// - `PREMIUM_USER_DIRS`, `PREMIUM_USER_PATHS` (comma-separated)
    /// - `LINKS_PATH`
    /// - `RECOMMENDER_RANKINGS_DIR`, `RECOMMENDER_CLUSTERS_PATH`
    /// - `STAR_PERCENTILES` (comma-separated, ascending)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let in_format = match lookup("LOAD_IN_FORMAT") {
            None => None,
            Some(value) => Some(SourceFormat::from_str(&value).ok_or_else(|| {
                ConfigError::InvalidValue(format!("LOAD_IN_FORMAT={}", value))
            })?),
        };

        let star_percentiles = match lookup("STAR_PERCENTILES") {
            None => STAR_PERCENTILES.to_vec(),
            Some(value) => parse_percentiles(&value)?,
        };

        let config = Self {
            db_path: lookup("LUDOJ_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()).into(),
            batch_size: parsed(lookup, "LOAD_BATCH_SIZE", 100_000),
            in_format,
            dry_run: flag(lookup, "LOAD_DRY_RUN"),
            collection_paths: paths(lookup, "COLLECTION_PATHS"),
            user_paths: paths(lookup, "USER_PATHS"),
            premium_user_dirs: paths(lookup, "PREMIUM_USER_DIRS"),
            premium_user_paths: paths(lookup, "PREMIUM_USER_PATHS"),
            links_path: lookup("LINKS_PATH").map(PathBuf::from),
            recommender_rankings_dir: lookup("RECOMMENDER_RANKINGS_DIR").map(PathBuf::from),
            recommender_clusters_path: lookup("RECOMMENDER_CLUSTERS_PATH").map(PathBuf::from),
            star_percentiles,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue("LOAD_BATCH_SIZE must be > 0".to_string()));
        }
        Ok(())
    }
}

fn parse_percentiles(value: &str) -> Result<Vec<f64>, ConfigError> {
    let percentiles = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| ConfigError::InvalidValue(format!("STAR_PERCENTILES={}: {}", value, e)))?;

    let ascending = percentiles.windows(2).all(|pair| pair[0] < pair[1]);
    let bounded = percentiles.iter().all(|p| (0.0..=1.0).contains(p));
    if !ascending || !bounded {
        return Err(ConfigError::InvalidValue(format!(
            "STAR_PERCENTILES={} must ascend within [0, 1]",
            value
        )));
    }
    Ok(percentiles)
}

/// Settings of the `fillrankingdb` aggregator
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub db_path: PathBuf,
    pub week_day: Weekday,
    pub types: Vec<RankingType>,
    pub batch_size: usize,
    pub dry_run: bool,
}

impl RankingConfig {
    /// Environment variables:
    /// - `LUDOJ_DB_PATH` (default: data/ludoj.db)
    /// - `RANKING_WEEK_DAY` (default: SUN)
    /// - `RANKING_TYPES` (comma-separated codes, default: all)
    /// - `LOAD_BATCH_SIZE` (default: 100000)
    /// - `LOAD_DRY_RUN` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let week_day = match lookup("RANKING_WEEK_DAY") {
            None => Weekday::Sun,
            Some(value) => parse_week_day(&value)
                .ok_or_else(|| ConfigError::InvalidValue(format!("RANKING_WEEK_DAY={}", value)))?,
        };

        let types = match lookup("RANKING_TYPES") {
            None => RankingType::all().to_vec(),
            Some(value) => parse_ranking_types(&value)?,
        };

        Ok(Self {
            db_path: lookup("LUDOJ_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()).into(),
            week_day,
            types,
            batch_size: parsed(lookup, "LOAD_BATCH_SIZE", 100_000usize).max(1),
            dry_run: flag(lookup, "LOAD_DRY_RUN"),
        })
    }
}

/// Comma or whitespace separated ranking type codes
pub fn parse_ranking_types(value: &str) -> Result<Vec<RankingType>, ConfigError> {
    let mut types = Vec::new();
    for code in value.split(|c: char| c == ',' || c.is_whitespace()).filter(|c| !c.is_empty()) {
        let ranking_type = RankingType::from_str(code)
            .ok_or_else(|| ConfigError::InvalidValue(format!("unknown ranking type {}", code)))?;
        if !types.contains(&ranking_type) {
            types.push(ranking_type);
        }
    }
    Ok(types)
}

/// Settings of the `charts` generator
#[derive(Debug, Clone)]
pub struct ChartsConfig {
    pub freq: Frequency,
    pub out_dir: PathBuf,
    pub out_file: String,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
    pub overwrite: bool,
    pub dry_run: bool,
    pub max_rows: Option<usize>,
    /// Exponential decay instead of the fixed 30 day window
    pub halflife_days: Option<f64>,
}

impl ChartsConfig {
    /// Environment variables:
    /// - `CHARTS_FREQ` (week, month or year; default: week)
    /// - `CHARTS_OUT_DIR` (default: .)
    /// - `CHARTS_OUT_FILE` (default: %Y%m%d-%H%M%S.csv)
    /// - `CHARTS_MIN_DATE`, `CHARTS_MAX_DATE`
    /// - `CHARTS_OVERWRITE` (default: false)
    /// - `CHARTS_MAX_ROWS`
    /// - `CHARTS_HALFLIFE_DAYS` (switches to decay mode)
    /// - `LOAD_DRY_RUN` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let freq = match lookup("CHARTS_FREQ") {
            None => Frequency::Week,
            Some(value) => Frequency::from_str(&value)
                .ok_or_else(|| ConfigError::InvalidValue(format!("CHARTS_FREQ={}", value)))?,
        };

        let halflife_days = match lookup("CHARTS_HALFLIFE_DAYS") {
            None => None,
            Some(value) => Some(parse_halflife(&value).ok_or_else(|| {
                ConfigError::InvalidValue(format!("CHARTS_HALFLIFE_DAYS={}", value))
            })?),
        };

        Ok(Self {
            freq,
            out_dir: lookup("CHARTS_OUT_DIR").unwrap_or_else(|| ".".to_string()).into(),
            out_file: lookup("CHARTS_OUT_FILE").unwrap_or_else(|| "%Y%m%d-%H%M%S.csv".to_string()),
            min_date: date(lookup, "CHARTS_MIN_DATE")?,
            max_date: date(lookup, "CHARTS_MAX_DATE")?,
            overwrite: flag(lookup, "CHARTS_OVERWRITE"),
            dry_run: flag(lookup, "LOAD_DRY_RUN"),
            max_rows: lookup("CHARTS_MAX_ROWS").and_then(|s| s.trim().parse().ok()),
            halflife_days,
        })
    }

    pub fn mode(&self) -> ChartsMode {
        match self.halflife_days {
            Some(halflife_days) => ChartsMode::Decay { halflife_days },
            None => ChartsMode::Fixed { days: 30 },
        }
    }
}

/// A positive, finite number of days
pub fn parse_halflife(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|days| days.is_finite() && *days > 0.0)
}
