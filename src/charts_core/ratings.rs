//! Rating events read from scraped user ratings

use crate::dates::datetime_from_value;
use crate::error::LoadError;
use crate::model::reference::id_from_value;
use crate::report::LoadReport;
use crate::source::{Record, RecordReader, SourceFormat};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct RatingEvent {
    pub bgg_id: i64,
    pub rating: f64,
    pub timestamp: DateTime<Utc>,
}

impl RatingEvent {
    /// `None` unless `bgg_id`, `bgg_user_rating` and `updated_at` are all set
    pub fn from_record(record: &Record) -> Option<Self> {
        let bgg_id = record.get("bgg_id").and_then(id_from_value).filter(|id| *id != 0)?;
        let rating = record
            .get("bgg_user_rating")
            .and_then(|value| match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .filter(|r| r.is_finite() && *r != 0.0)?;
        let timestamp = record.get("updated_at").and_then(datetime_from_value)?;

        Some(Self { bgg_id, rating, timestamp })
    }
}

/// Read rating events from a JSON-lines file, at most `max_rows` lines
pub fn read_ratings(
    path: &Path,
    max_rows: Option<usize>,
) -> Result<(Vec<RatingEvent>, LoadReport), LoadError> {
    log::info!("📖 Reading ratings data from <{}>", path.display());

    let mut reader = RecordReader::new(&[path], Some(SourceFormat::JsonLines));
    let mut report = LoadReport::new();
    let limit = max_rows.unwrap_or(usize::MAX);

    let events: Vec<RatingEvent> = reader
        .by_ref()
        .take(limit)
        .filter_map(|record| {
            report.processed += 1;
            let event = RatingEvent::from_record(&record);
            if event.is_none() {
                report.skipped += 1;
            }
            event
        })
        .collect();

    report.merge(reader.report());
    if reader.readable_sources() == 0 {
        return Err(LoadError::source_unavailable(path, "ratings file not readable"));
    }

    log::info!("✅ Read {} rating events", events.len());
    Ok((events, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ratings.jl");
        fs::write(
            &path,
            concat!(
                "{\"bgg_id\": 13, \"bgg_user_rating\": 8.5, \"updated_at\": \"2024-01-05T10:00:00Z\"}\n",
                "{\"bgg_id\": 822, \"bgg_user_rating\": null, \"updated_at\": \"2024-01-05T10:00:00Z\"}\n",
                "{\"bgg_id\": \"9209\", \"bgg_user_rating\": \"7\", \"updated_at\": \"2024-01-06\"}\n",
                "{\"bgg_id\": 13, \"bgg_user_rating\": 6}\n",
            ),
        )
        .unwrap();

        let (events, report) = read_ratings(&path, None).unwrap();

        let ids: Vec<_> = events.iter().map(|e| (e.bgg_id, e.rating)).collect();
        assert_eq!(ids, vec![(13, 8.5), (9209, 7.0)]);
        assert_eq!(report.processed, 4);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_max_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ratings.jl");
        let line = "{\"bgg_id\": 13, \"bgg_user_rating\": 8, \"updated_at\": \"2024-01-05\"}\n";
        fs::write(&path, line.repeat(5)).unwrap();

        let (events, _) = read_ratings(&path, Some(2)).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let outcome = read_ratings(Path::new("/no/such/ratings.jl"), None);
        assert!(matches!(outcome, Err(LoadError::SourceUnavailable { .. })));
    }
}
