//! Weekly, monthly and annual charts written as ranking CSVs

use super::ratings::RatingEvent;
use super::scorer::{ChartEntry, ChartsMode, ChartsScorer};
use crate::error::LoadError;
use crate::report::LoadReport;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Week,
    Month,
    Year,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Week => "weekly",
            Frequency::Month => "monthly",
            Frequency::Year => "annual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weekly" => Some(Frequency::Week),
            "month" | "monthly" => Some(Frequency::Month),
            "year" | "yearly" | "annual" => Some(Frequency::Year),
            _ => None,
        }
    }

    pub fn min_raw_score(&self) -> f64 {
        match self {
            Frequency::Week => 10.0,
            Frequency::Month => 25.0,
            Frequency::Year => 100.0,
        }
    }

    /// Start of the period containing `date`: Monday, first of month or Jan 1
    pub fn snap(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Frequency::Month => date.with_day(1).unwrap_or(date),
            Frequency::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Week => date.checked_add_signed(Duration::days(7)),
            Frequency::Month => date.checked_add_months(Months::new(1)),
            Frequency::Year => date.checked_add_months(Months::new(12)),
        }
    }

    /// Consecutive `(start, end)` boundaries from the snapped `first` up to `last`
    pub fn periods(&self, first: DateTime<Utc>, last: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut boundaries = Vec::new();
        let mut current = Some(self.snap(first.date_naive()));

        while let Some(date) = current {
            let Some(boundary) = date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive)) else {
                break;
            };
            if boundary > last {
                break;
            }
            boundaries.push(boundary);
            current = self.advance(date);
        }

        boundaries.windows(2).map(|pair| (pair[0], pair[1])).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ChartsSchedule {
    pub freq: Frequency,
    pub out_dir: PathBuf,
    /// strftime pattern applied to the period end
    pub out_file: String,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
    pub overwrite: bool,
    pub dry_run: bool,
    /// Weighting of the events inside each period
    pub mode: ChartsMode,
}

impl ChartsSchedule {
    pub fn new(freq: Frequency, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            freq,
            out_dir: out_dir.into(),
            out_file: "%Y%m%d-%H%M%S.csv".to_string(),
            min_date: None,
            max_date: None,
            overwrite: false,
            dry_run: false,
            mode: ChartsMode::Fixed { days: 30 },
        }
    }

    /// Compute and write the charts of every complete period
    pub fn run(&self, events: &[RatingEvent]) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::new();

        let (Some(earliest), Some(latest)) = (
            events.iter().map(|e| e.timestamp).min(),
            events.iter().map(|e| e.timestamp).max(),
        ) else {
            log::warn!("⚠️  No ratings, no charts");
            return Ok(report);
        };

        let first = self.min_date.map_or(earliest, |min| min.max(earliest));
        let last = self.max_date.map_or(latest, |max| max.min(latest));
        log::info!("📊 Earliest date: {}; latest date: {}", first, last);

        log::info!("📁 Writing charts to <{}>", self.out_dir.display());
        if !self.dry_run {
            std::fs::create_dir_all(&self.out_dir)?;
        }

        let scorer = ChartsScorer::new(self.mode)
            .with_min_raw_score(Some(self.freq.min_raw_score()));

        for (start, end) in self.freq.periods(first, last) {
            log::info!("📊 Calculating {} charts for {}", self.freq.as_str(), end.format("%Y-%m-%d"));
            report.processed += 1;

            let out_path = self.out_dir.join(end.format(&self.out_file).to_string());
            if !self.overwrite && out_path.exists() {
                log::info!("   └─ <{}> exists, skipping", out_path.display());
                report.skipped += 1;
                continue;
            }

            let charts = scorer.calculate(events, Some(start), end);
            log::info!("   ├─ Found {} chart entries", charts.len());

            if charts.is_empty() {
                report.skipped += 1;
                continue;
            }
            if self.dry_run {
                continue;
            }

            match write_charts(&out_path, &charts) {
                Ok(()) => {
                    log::info!("   └─ ✅ Wrote <{}>", out_path.display());
                    report.created += 1;
                }
                Err(e) => {
                    log::error!("❌ Failed to write <{}>: {}", out_path.display(), e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Write `rank,bgg_id,score` rows
pub fn write_charts(path: &Path, charts: &[ChartEntry]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in charts {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking_core::read_snapshot;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_snap() {
        // 2024-01-10 is a Wednesday
        assert_eq!(Frequency::Week.snap(date(2024, 1, 10)), date(2024, 1, 8));
        assert_eq!(Frequency::Month.snap(date(2024, 1, 10)), date(2024, 1, 1));
        assert_eq!(Frequency::Year.snap(date(2024, 5, 10)), date(2024, 1, 1));
    }

    #[test]
    fn test_periods_are_consecutive() {
        let periods = Frequency::Month.periods(at(2024, 1, 10), at(2024, 4, 2));

        let ends: Vec<_> = periods.iter().map(|(_, end)| end.date_naive()).collect();
        assert_eq!(ends, vec![date(2024, 2, 1), date(2024, 3, 1), date(2024, 4, 1)]);
        assert_eq!(periods[1].0, periods[0].1);
    }

    #[test]
    fn test_frequency_names() {
        assert_eq!(Frequency::from_str("week"), Some(Frequency::Week));
        assert_eq!(Frequency::from_str("YEAR"), Some(Frequency::Year));
        assert_eq!(Frequency::from_str("daily"), None);
        assert_eq!(Frequency::Month.min_raw_score(), 25.0);
    }

    #[test]
    fn test_run_writes_ranking_csvs() {
        let dir = tempdir().unwrap();
        let mut events = Vec::new();
        // week of 2024-01-08: game 13 gets many top ratings, 822 many low ones
        for day in 8..15 {
            for _ in 0..2 {
                events.push(RatingEvent { bgg_id: 13, rating: 10.0, timestamp: at(2024, 1, day) });
                events.push(RatingEvent { bgg_id: 822, rating: 1.0, timestamp: at(2024, 1, day) });
                events.push(RatingEvent { bgg_id: 9209, rating: 6.0, timestamp: at(2024, 1, day) });
            }
        }
        events.push(RatingEvent { bgg_id: 9209, rating: 6.0, timestamp: at(2024, 1, 16) });

        let schedule = ChartsSchedule::new(Frequency::Week, dir.path());
        let report = schedule.run(&events).unwrap();

        let path = dir.path().join("20240115-000000.csv");
        assert!(path.exists());
        assert_eq!(report.created, 1);

        let snapshot = read_snapshot(&path, None).unwrap();
        assert_eq!(snapshot.date, date(2024, 1, 15));
        let ids: Vec<_> = snapshot.rows.iter().map(|r| (r.rank, r.bgg_id)).collect();
        assert_eq!(ids, vec![(Some(1), 13)]);

        // second run leaves the file alone
        let again = schedule.run(&events).unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.skipped, 1);
    }

    #[test]
    fn test_run_with_decay_mode() {
        let dir = tempdir().unwrap();
        let mut events = Vec::new();
        for day in 8..15 {
            for _ in 0..2 {
                events.push(RatingEvent { bgg_id: 13, rating: 10.0, timestamp: at(2024, 1, day) });
                events.push(RatingEvent { bgg_id: 822, rating: 1.0, timestamp: at(2024, 1, day) });
            }
        }
        events.push(RatingEvent { bgg_id: 822, rating: 5.0, timestamp: at(2024, 1, 16) });

        let mut schedule = ChartsSchedule::new(Frequency::Week, dir.path());
        // long half-life: weights stay close to 1
        schedule.mode = ChartsMode::Decay { halflife_days: 3650.0 };
        let report = schedule.run(&events).unwrap();

        assert_eq!(report.created, 1);
        let snapshot = read_snapshot(&dir.path().join("20240115-000000.csv"), None).unwrap();
        let ids: Vec<_> = snapshot.rows.iter().map(|r| r.bgg_id).collect();
        assert_eq!(ids, vec![13]);
        assert!(snapshot.rows[0].score.unwrap() < 14.0);
    }
}
