//! Dated ranking snapshot files
//!
//! A snapshot is a CSV with at least `rank`, `bgg_id` and `score` columns;
//! the file stem holds its date (`20240107-120000.csv`, `2024-01-07.csv`, ...).

use crate::dates::parse_datetime;
use crate::error::LoadError;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnapshotRow {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub rank: Option<u32>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub bgg_id: i64,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RankingSnapshot {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub rows: Vec<SnapshotRow>,
}

/// Date encoded in the file stem
pub fn snapshot_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    parse_datetime(stem).map(|dt| dt.date_naive())
}

/// Parse all rows; rows that do not fit are logged and skipped
pub fn read_rows(path: &Path) -> Result<Vec<SnapshotRow>, LoadError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| LoadError::source_unavailable(path, e))?;

    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<SnapshotRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!(
                "⚠️  Skipping row {} of <{}>: {}",
                line + 2,
                path.display(),
                e
            ),
        }
    }
    Ok(rows)
}

/// Read one snapshot; `date` overrides the date in the file name
pub fn read_snapshot(path: &Path, date: Option<NaiveDate>) -> Result<RankingSnapshot, LoadError> {
    let date = date.or_else(|| snapshot_date(path)).ok_or_else(|| {
        LoadError::MalformedRecord(format!("no date in file name <{}>", path.display()))
    })?;

    log::debug!("📖 Reading ranking from <{}>", path.display());
    Ok(RankingSnapshot {
        date,
        path: path.to_path_buf(),
        rows: read_rows(path)?,
    })
}

/// Dated `*.csv` files of a directory, sorted by file name
pub fn list_snapshots(dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::source_unavailable(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    Ok(files
        .into_iter()
        .filter_map(|path| match snapshot_date(&path) {
            Some(date) => Some((date, path)),
            None => {
                log::warn!("⚠️  Ignoring <{}>: no date in file name", path.display());
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_date_from_stem() {
        assert_eq!(
            snapshot_date(Path::new("/data/bgg/20240107-120000.csv")),
            NaiveDate::from_ymd_opt(2024, 1, 7)
        );
        assert_eq!(
            snapshot_date(Path::new("2024-01-03T10-00-00.csv")),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(snapshot_date(Path::new("latest.csv")), None);
    }

    #[test]
    fn test_read_rows_ignores_extra_columns_and_bad_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2024-01-01.csv");
        fs::write(
            &path,
            "rank,bgg_id,name,score\n1,13,Catan,8.5\n2,oops,Broken,7\n3,\"822\",Carcassonne,\n",
        )
        .unwrap();

        let snapshot = read_snapshot(&path, None).unwrap();

        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(
            snapshot.rows,
            vec![
                SnapshotRow { rank: Some(1), bgg_id: 13, score: Some(8.5) },
                SnapshotRow { rank: Some(3), bgg_id: 822, score: None },
            ]
        );
    }

    #[test]
    fn test_list_snapshots_sorted_and_dated() {
        let dir = tempdir().unwrap();
        for name in ["20240103-000000.csv", "20240101-000000.csv", "notes.csv", "readme.txt"] {
            fs::write(dir.path().join(name), "rank,bgg_id,score\n").unwrap();
        }

        let files = list_snapshots(dir.path()).unwrap();

        let dates: Vec<_> = files.iter().map(|(date, _)| date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-03"]);
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let outcome = list_snapshots(Path::new("/definitely/not/here"));
        assert!(matches!(outcome, Err(LoadError::SourceUnavailable { .. })));
    }
}
