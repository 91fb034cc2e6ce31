//! Lazy record reader over heterogeneous source files

use super::format::SourceFormat;
use super::Record;
use crate::error::LoadError;
use crate::report::LoadReport;
use serde_json::Value;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

type RecordIter = Box<dyn Iterator<Item = Result<Record, LoadError>>>;

/// Streams records from every path in order, skipping whatever fails to parse.
///
/// Unreadable paths and malformed records are counted in [`RecordReader::report`];
/// iterate with `by_ref()` to keep access to the counters.
pub struct RecordReader {
    paths: VecDeque<PathBuf>,
    format: Option<SourceFormat>,
    current: Option<RecordIter>,
    report: LoadReport,
    readable_sources: usize,
}

impl RecordReader {
    pub fn new<P: AsRef<Path>>(paths: &[P], format: Option<SourceFormat>) -> Self {
        Self {
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            format,
            current: None,
            report: LoadReport::new(),
            readable_sources: 0,
        }
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Number of paths that could be opened so far
    pub fn readable_sources(&self) -> usize {
        self.readable_sources
    }

    fn open_next(&mut self) -> bool {
        while let Some(path) = self.paths.pop_front() {
            let format = self.format.unwrap_or_else(|| SourceFormat::from_path(&path));
            match open_source(&path, format) {
                Ok(iter) => {
                    self.readable_sources += 1;
                    self.current = Some(iter);
                    return true;
                }
                Err(e) => {
                    log::error!("❌ {}", e);
                    self.report.unavailable_sources += 1;
                }
            }
        }
        false
    }
}

impl Iterator for RecordReader {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(iter) = self.current.as_mut() {
                match iter.next() {
                    Some(outcome) => {
                        if let Some(record) = self.report.record(outcome) {
                            return Some(record);
                        }
                        continue;
                    }
                    None => self.current = None,
                }
            }

            if !self.open_next() {
                return None;
            }
        }
    }
}

/// Convenience wrapper reading a single path
pub fn read_records(path: &Path, format: Option<SourceFormat>) -> RecordReader {
    RecordReader::new(&[path], format)
}

fn open_source(path: &Path, format: SourceFormat) -> Result<RecordIter, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::source_unavailable(path, e))?;
    let reader = BufReader::new(file);

    match format {
        SourceFormat::JsonLines => {
            log::info!("📖 Loading JSON lines from <{}>", path.display());
            Ok(Box::new(json_lines(reader)))
        }
        SourceFormat::Json => {
            log::info!("📖 Loading JSON from <{}>", path.display());
            let values: Vec<Value> = serde_json::from_reader(reader)
                .map_err(|e| LoadError::source_unavailable(path, e))?;
            Ok(Box::new(values.into_iter().map(into_record)))
        }
        SourceFormat::Yaml => {
            log::info!("📖 Loading YAML from <{}>", path.display());
            let values: Vec<serde_yaml::Value> = serde_yaml::from_reader(reader)
                .map_err(|e| LoadError::source_unavailable(path, e))?;
            Ok(Box::new(values.into_iter().map(|value| {
                serde_json::to_value(value)
                    .map_err(LoadError::from)
                    .and_then(into_record)
            })))
        }
    }
}

fn json_lines<R: BufRead + 'static>(reader: R) -> impl Iterator<Item = Result<Record, LoadError>> {
    reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(|(number, line)| {
            let line = line?;
            let value: Value = serde_json::from_str(&line).map_err(|e| {
                LoadError::MalformedRecord(format!("line {}: {}", number + 1, e))
            })?;
            into_record(value)
        })
}

fn into_record(value: Value) -> Result<Record, LoadError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(LoadError::MalformedRecord(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_lines_skip_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("games.jl");
        fs::write(
            &path,
            "{\"bgg_id\": 1}\nnot json\n\n{\"bgg_id\": 2}\n[1, 2]\n",
        )
        .unwrap();

        let mut reader = read_records(&path, None);
        let records: Vec<Record> = reader.by_ref().collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["bgg_id"], 2);
        assert_eq!(reader.report().skipped, 2);
        assert_eq!(reader.report().processed, 4);
    }

    #[test]
    fn test_json_array_and_yaml_in_path_order() {
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("a.json");
        let yaml_path = dir.path().join("b.yaml");
        fs::write(&json_path, r#"[{"bgg_id": 1}, 7, {"bgg_id": 2}]"#).unwrap();
        fs::write(&yaml_path, "- bgg_id: 3\n  name: Catan\n- bgg_id: 4\n").unwrap();

        let mut reader = RecordReader::new(&[&json_path, &yaml_path], None);
        let ids: Vec<i64> = reader
            .by_ref()
            .map(|r| r["bgg_id"].as_i64().unwrap())
            .collect();

        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(reader.report().skipped, 1);
        assert_eq!(reader.readable_sources(), 2);
    }

    #[test]
    fn test_missing_path_does_not_stop_other_sources() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.jsonl");
        fs::write(&present, "{\"bgg_id\": 9}\n").unwrap();
        let missing = dir.path().join("missing.jsonl");

        let mut reader = RecordReader::new(&[&missing, &present], None);
        let records: Vec<Record> = reader.by_ref().collect();

        assert_eq!(records.len(), 1);
        assert_eq!(reader.report().unavailable_sources, 1);
        assert_eq!(reader.readable_sources(), 1);
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("games.txt");
        fs::write(&path, "{\"bgg_id\": 1}\n{\"bgg_id\": 2}\n").unwrap();

        let records: Vec<Record> = read_records(&path, Some(SourceFormat::JsonLines)).collect();

        assert_eq!(records.len(), 2);
    }
}
