use crate::charts_core::{read_ratings, ChartsSchedule};
use crate::config::ChartsConfig;
use crate::error::LoadError;
use crate::report::LoadReport;
use std::path::Path;

/// Read ratings and write one charts CSV per complete period
pub fn run_charts(ratings_path: &Path, config: &ChartsConfig) -> Result<LoadReport, LoadError> {
    let (events, mut report) = read_ratings(ratings_path, config.max_rows)?;

    let schedule = ChartsSchedule {
        freq: config.freq,
        out_dir: config.out_dir.clone(),
        out_file: config.out_file.clone(),
        min_date: config.min_date,
        max_date: config.max_date,
        overwrite: config.overwrite,
        dry_run: config.dry_run,
        mode: config.mode(),
    };

    let written = schedule.run(&events)?;
    log::info!(
        "✅ {} charts: {} written, {} skipped",
        config.freq.as_str(),
        written.created,
        written.skipped
    );

    // the ratings count as processed items, not the periods
    report.created += written.created;
    report.failed += written.failed;
    report.log_summary("charts");
    Ok(report)
}
