//! Ranking aggregation: Scanning → Grouping → Reducing → Emitting
//!
//! Scanning and grouping only look at file names. Each period is then read,
//! reduced and emitted on demand, so at most one period's rows are held in
//! memory at a time.

use super::period::following;
use super::snapshot::{list_snapshots, read_snapshot, SnapshotRow};
use crate::error::LoadError;
use crate::model::{RankingRecord, RankingType, ReductionPolicy};
use crate::report::LoadReport;
use chrono::{NaiveDate, Weekday};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Weekly periods end on this day
    pub anchor: Weekday,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            anchor: Weekday::Sun,
            min_date: None,
            max_date: None,
        }
    }
}

/// Files sharing one period key
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub key: NaiveDate,
    pub files: Vec<(NaiveDate, PathBuf)>,
}

/// Group dated files into periods; the `All` policy keeps every date apart
pub fn group_periods(
    files: Vec<(NaiveDate, PathBuf)>,
    policy: ReductionPolicy,
    anchor: Weekday,
) -> Vec<Period> {
    let mut periods: BTreeMap<NaiveDate, Vec<(NaiveDate, PathBuf)>> = BTreeMap::new();

    for (date, path) in files {
        let key = match policy {
            ReductionPolicy::All => date,
            ReductionPolicy::Last | ReductionPolicy::Mean => following(date, anchor),
        };
        periods.entry(key).or_default().push((date, path));
    }

    periods
        .into_iter()
        .map(|(key, mut files)| {
            // stable: equal dates keep file name order
            files.sort_by_key(|(date, _)| *date);
            Period { key, files }
        })
        .collect()
}

/// Per entity, the row of the chronologically last snapshot, ordered by
/// original rank (unranked rows last)
pub fn reduce_last(snapshots: &[Vec<SnapshotRow>]) -> Vec<i64> {
    let mut latest: HashMap<i64, &SnapshotRow> = HashMap::new();
    for rows in snapshots {
        for row in rows {
            latest.insert(row.bgg_id, row);
        }
    }

    let mut rows: Vec<&SnapshotRow> = latest.into_values().collect();
    rows.sort_by(|a, b| match (a.rank, b.rank) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.bgg_id.cmp(&b.bgg_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.bgg_id.cmp(&b.bgg_id),
    });
    rows.into_iter().map(|row| row.bgg_id).collect()
}

/// Per entity, the mean score across all rows, ordered descending.
///
/// Entities without a single usable score have no mean and rank last,
/// ordered by id.
pub fn reduce_mean(snapshots: &[Vec<SnapshotRow>]) -> Vec<i64> {
    let mut sums: HashMap<i64, (f64, usize)> = HashMap::new();
    for row in snapshots.iter().flatten() {
        let entry = sums.entry(row.bgg_id).or_insert((0.0, 0));
        if let Some(score) = row.score.filter(|s| s.is_finite()) {
            entry.0 += score;
            entry.1 += 1;
        }
    }

    let mut means: Vec<(i64, Option<f64>)> = sums
        .into_iter()
        .map(|(id, (sum, count))| (id, (count > 0).then(|| sum / count as f64)))
        .collect();
    means.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.total_cmp(&x).then(a.0.cmp(&b.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });
    means.into_iter().map(|(id, _)| id).collect()
}

/// Turn an ordered id list into dense 1-based ranking rows, dropping
/// unknown ids first
pub fn emit(
    ordered: Vec<i64>,
    ranking_type: RankingType,
    date: NaiveDate,
    known_ids: Option<&HashSet<i64>>,
) -> Vec<RankingRecord> {
    ordered
        .into_iter()
        .filter(|id| known_ids.map_or(true, |known| known.contains(id)))
        .enumerate()
        .map(|(index, game_id)| RankingRecord {
            game_id,
            ranking_type,
            rank: index as u32 + 1,
            date,
        })
        .collect()
}

pub struct RankingAggregator<'a> {
    ranking_type: RankingType,
    known_ids: Option<&'a HashSet<i64>>,
    periods: VecDeque<Period>,
    report: LoadReport,
}

impl<'a> RankingAggregator<'a> {
    /// Scan `dir` and group its snapshots into periods
    pub fn new(
        dir: &Path,
        ranking_type: RankingType,
        options: &AggregatorOptions,
        known_ids: Option<&'a HashSet<i64>>,
    ) -> Result<Self, LoadError> {
        log::info!(
            "🔍 Scanning <{}> for {} rankings ({:?})",
            dir.display(),
            ranking_type,
            ranking_type.policy()
        );

        let min_date = match (ranking_type.min_date(), options.min_date) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let files: Vec<_> = list_snapshots(dir)?
            .into_iter()
            .filter(|(date, _)| min_date.map_or(true, |min| *date >= min))
            .filter(|(date, _)| options.max_date.map_or(true, |max| *date <= max))
            .collect();

        let periods = group_periods(files, ranking_type.policy(), options.anchor);
        log::info!("   └─ {} periods to aggregate", periods.len());

        Ok(Self {
            ranking_type,
            known_ids,
            periods: periods.into(),
            report: LoadReport::new(),
        })
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    fn reduce(&mut self, period: &Period) -> Result<Vec<RankingRecord>, LoadError> {
        let mut snapshots = Vec::with_capacity(period.files.len());
        for (date, path) in &period.files {
            match read_snapshot(path, Some(*date)) {
                Ok(snapshot) => {
                    self.report.processed += snapshot.rows.len();
                    snapshots.push(snapshot.rows);
                }
                Err(e) => {
                    log::error!("❌ {}", e);
                    self.report.unavailable_sources += 1;
                }
            }
        }

        let ordered = match self.ranking_type.policy() {
            ReductionPolicy::Mean => reduce_mean(&snapshots),
            ReductionPolicy::Last | ReductionPolicy::All => reduce_last(&snapshots),
        };
        let total = ordered.len();
        let records = emit(ordered, self.ranking_type, period.key, self.known_ids);
        self.report.skipped += total - records.len();

        if records.is_empty() {
            return Err(LoadError::EmptyAggregation(format!(
                "{} rankings for {}",
                self.ranking_type, period.key
            )));
        }
        Ok(records)
    }
}

impl<'a> Iterator for RankingAggregator<'a> {
    /// One period's rows, all dated with the period key
    type Item = Vec<RankingRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(period) = self.periods.pop_front() {
            log::info!(
                "📊 Processing {} rankings for the period ending {} ({} files)",
                self.ranking_type,
                period.key,
                period.files.len()
            );

            match self.reduce(&period) {
                Ok(records) => return Some(records),
                Err(e) => log::debug!("   └─ {}", e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(rank: u32, bgg_id: i64, score: f64) -> SnapshotRow {
        SnapshotRow { rank: Some(rank), bgg_id, score: Some(score) }
    }

    #[test]
    fn test_weekly_grouping() {
        let files = vec![
            (date(2024, 1, 1), PathBuf::from("a.csv")),
            (date(2024, 1, 3), PathBuf::from("b.csv")),
            (date(2024, 1, 7), PathBuf::from("c.csv")),
            (date(2024, 1, 8), PathBuf::from("d.csv")),
        ];

        let periods = group_periods(files, ReductionPolicy::Last, Weekday::Sun);

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].key, date(2024, 1, 7));
        assert_eq!(periods[0].files.len(), 3);
        assert_eq!(periods[1].key, date(2024, 1, 14));
    }

    #[test]
    fn test_all_policy_keeps_dates_apart() {
        let files = vec![
            (date(2024, 1, 1), PathBuf::from("a.csv")),
            (date(2024, 1, 3), PathBuf::from("b.csv")),
        ];

        let periods = group_periods(files, ReductionPolicy::All, Weekday::Sun);

        let keys: Vec<_> = periods.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![date(2024, 1, 1), date(2024, 1, 3)]);
    }

    #[test]
    fn test_last_keeps_latest_row() {
        let early = vec![row(1, 10, 9.0), row(2, 20, 8.0), row(3, 30, 7.0)];
        let late = vec![row(1, 20, 9.5), row(2, 10, 9.0)];

        assert_eq!(reduce_last(&[early, late]), vec![20, 10, 30]);
    }

    #[test]
    fn test_mean_ranks_by_average_score() {
        let first = vec![row(1, 10, 8.0), row(2, 20, 6.0), row(3, 30, 7.0)];
        let second = vec![row(1, 20, 9.0), row(2, 10, 7.0), row(3, 30, 7.0)];

        // 10 → 7.5, 20 → 7.5, 30 → 7.0; tie broken by id
        assert_eq!(reduce_mean(&[first, second]), vec![10, 20, 30]);
    }

    #[test]
    fn test_mean_ranks_scoreless_entities_last() {
        let first = vec![
            SnapshotRow { rank: Some(1), bgg_id: 40, score: None },
            row(2, 10, 5.0),
        ];
        let second = vec![
            SnapshotRow { rank: Some(1), bgg_id: 40, score: None },
            SnapshotRow { rank: Some(2), bgg_id: 5, score: Some(f64::NAN) },
            row(3, 20, 7.0),
        ];

        assert_eq!(reduce_mean(&[first, second]), vec![20, 10, 5, 40]);
    }

    #[test]
    fn test_emit_renumbers_after_filter() {
        let known: HashSet<i64> = [10, 30].into_iter().collect();
        let records = emit(vec![10, 20, 30], RankingType::Bgg, date(2024, 1, 7), Some(&known));

        let ranks: Vec<_> = records.iter().map(|r| (r.game_id, r.rank)).collect();
        assert_eq!(ranks, vec![(10, 1), (30, 2)]);
    }

    #[test]
    fn test_single_file_last_period() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("20240103-000000.csv"),
            "rank,bgg_id,score\n1,13,9.1\n2,822,8.7\n3,9209,8.2\n",
        )
        .unwrap();

        let mut aggregator = RankingAggregator::new(
            dir.path(),
            RankingType::Bgg,
            &AggregatorOptions::default(),
            None,
        )
        .unwrap();
        let periods: Vec<_> = aggregator.by_ref().collect();

        assert_eq!(periods.len(), 1);
        let ids: Vec<_> = periods[0].iter().map(|r| (r.game_id, r.rank, r.date)).collect();
        assert_eq!(
            ids,
            vec![
                (13, 1, date(2024, 1, 7)),
                (822, 2, date(2024, 1, 7)),
                (9209, 3, date(2024, 1, 7)),
            ]
        );
        assert_eq!(aggregator.report().processed, 3);
    }

    #[test]
    fn test_date_filters() {
        let dir = tempdir().unwrap();
        for name in ["2015-12-31.csv", "2016-01-01.csv", "2016-02-01.csv"] {
            fs::write(dir.path().join(name), "rank,bgg_id,score\n1,13,1.0\n").unwrap();
        }

        let options = AggregatorOptions {
            max_date: Some(date(2016, 1, 31)),
            ..AggregatorOptions::default()
        };
        let periods: Vec<_> =
            RankingAggregator::new(dir.path(), RankingType::Charts, &options, None)
                .unwrap()
                .collect();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0][0].date, date(2016, 1, 1));
    }
}
