//! Trending score over a window of rating events

use super::ratings::RatingEvent;
use crate::stats::{descending_percentile_ranks, quantile};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 60.0 * 60.0 * 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartsMode {
    /// Every event in the trailing `days` counts once
    Fixed { days: i64 },
    /// Events lose half their weight every `halflife_days`
    Decay { halflife_days: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartEntry {
    pub rank: u32,
    pub bgg_id: i64,
    pub score: f64,
}

pub struct ChartsScorer {
    mode: ChartsMode,
    lower_percentile: f64,
    upper_percentile: f64,
    min_raw_score: Option<f64>,
}

#[derive(Default)]
struct Tally {
    positive: f64,
    negative: f64,
    events: usize,
}

impl ChartsScorer {
    pub fn new(mode: ChartsMode) -> Self {
        Self {
            mode,
            lower_percentile: 0.25,
            upper_percentile: 0.75,
            min_raw_score: None,
        }
    }

    pub fn with_percentiles(mut self, lower: f64, upper: f64) -> Self {
        self.lower_percentile = lower;
        self.upper_percentile = upper;
        self
    }

    pub fn with_min_raw_score(mut self, min_raw_score: Option<f64>) -> Self {
        self.min_raw_score = min_raw_score;
        self
    }

    /// Window bounds; `None` as the lower bound means unbounded
    pub fn window(
        &self,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> (Option<DateTime<Utc>>, DateTime<Utc>) {
        match self.mode {
            ChartsMode::Fixed { days } => (Some(start.unwrap_or(end - Duration::days(days))), end),
            ChartsMode::Decay { .. } => (start, end),
        }
    }

    fn weight(&self, timestamp: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        match self.mode {
            ChartsMode::Fixed { .. } => 1.0,
            ChartsMode::Decay { halflife_days } => {
                let age = (end - timestamp).num_milliseconds() as f64 / 1000.0;
                (-age / (halflife_days * SECONDS_PER_DAY)).exp2()
            }
        }
    }

    /// Compute the charts for the window ending at `end`
    ///
    /// # Factors
    /// - Raw score: weight of ratings at or above the upper percentile minus
    ///   weight of ratings at or below the lower percentile
    /// - Popularity: descending percentile rank of the in-window event count
    ///
    /// # Returns
    /// Entries sorted by `raw score × popularity` descending, ties by id, ranked 1..N
    pub fn calculate(
        &self,
        events: &[RatingEvent],
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> Vec<ChartEntry> {
        let (lower_bound, upper_bound) = self.window(start, end);
        let in_window: Vec<&RatingEvent> = events
            .iter()
            .filter(|e| e.timestamp <= upper_bound)
            .filter(|e| lower_bound.map_or(true, |lower| e.timestamp >= lower))
            .collect();

        let ratings: Vec<f64> = in_window.iter().map(|e| e.rating).collect();
        let (Some(lower), Some(upper)) = (
            quantile(&ratings, self.lower_percentile),
            quantile(&ratings, self.upper_percentile),
        ) else {
            return Vec::new();
        };
        log::debug!(
            "Considering {} ratings; thresholds <= {:.2} / >= {:.2}",
            in_window.len(),
            lower,
            upper
        );

        let mut tallies: BTreeMap<i64, Tally> = BTreeMap::new();
        for event in &in_window {
            let weight = self.weight(event.timestamp, end);
            let tally = tallies.entry(event.bgg_id).or_default();
            tally.events += 1;
            if event.rating >= upper {
                tally.positive += weight;
            }
            if event.rating <= lower {
                tally.negative += weight;
            }
        }

        let counts: Vec<f64> = tallies.values().map(|t| t.events as f64).collect();
        let popularity = descending_percentile_ranks(&counts);

        let mut scored: Vec<(i64, f64)> = tallies
            .iter()
            .zip(popularity)
            .filter_map(|((&bgg_id, tally), pct)| {
                let raw = tally.positive - tally.negative;
                match self.min_raw_score {
                    Some(min) if raw < min => None,
                    _ => Some((bgg_id, raw * pct)),
                }
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .enumerate()
            .map(|(index, (bgg_id, score))| ChartEntry {
                rank: index as u32 + 1,
                bgg_id,
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
    }

    /// `count` ratings of `rating`, spread evenly over the 30 days before `end`
    fn spread(bgg_id: i64, rating: f64, count: usize) -> Vec<RatingEvent> {
        let window = 30 * 24 * 60 * 60;
        (0..count)
            .map(|i| {
                let offset = ((2 * i + 1) * window / (2 * count)) as i64;
                RatingEvent {
                    bgg_id,
                    rating,
                    timestamp: end() - Duration::seconds(offset),
                }
            })
            .collect()
    }

    fn sample() -> Vec<RatingEvent> {
        [
            spread(1, 9.0, 10),
            spread(2, 9.0, 6),
            spread(3, 9.0, 3),
            spread(4, 2.0, 5),
            spread(5, 5.0, 13),
        ]
        .concat()
    }

    #[test]
    fn test_fixed_window_ranking() {
        let scorer = ChartsScorer::new(ChartsMode::Fixed { days: 30 });
        let charts = scorer.calculate(&sample(), None, end());

        let order: Vec<_> = charts.iter().map(|c| c.bgg_id).collect();
        assert_eq!(order, vec![1, 2, 3, 5, 4]);
        assert_eq!(charts[0].rank, 1);
        assert!((charts[0].score - 4.0).abs() < 1e-9);
        assert!((charts[1].score - 3.6).abs() < 1e-9);
    }

    #[test]
    fn test_decay_approximates_fixed_window() {
        let events = sample();
        let start = end() - Duration::days(30);

        let fixed = ChartsScorer::new(ChartsMode::Fixed { days: 30 }).calculate(&events, None, end());
        let decay = ChartsScorer::new(ChartsMode::Decay { halflife_days: 30.0 })
            .calculate(&events, Some(start), end());

        let fixed_order: Vec<_> = fixed.iter().map(|c| c.bgg_id).collect();
        let decay_order: Vec<_> = decay.iter().map(|c| c.bgg_id).collect();
        assert_eq!(fixed_order, decay_order);

        let fixed_top = fixed[0].score;
        let decay_top = decay[0].score;
        for (f, d) in fixed.iter().zip(&decay) {
            assert!(
                (f.score / fixed_top - d.score / decay_top).abs() < 0.05,
                "{} vs {}",
                f.score / fixed_top,
                d.score / decay_top
            );
        }
    }

    #[test]
    fn test_min_raw_score_prunes() {
        let scorer = ChartsScorer::new(ChartsMode::Fixed { days: 30 }).with_min_raw_score(Some(5.0));
        let charts = scorer.calculate(&sample(), None, end());

        let order: Vec<_> = charts.iter().map(|c| (c.bgg_id, c.rank)).collect();
        assert_eq!(order, vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_events_outside_window_ignored() {
        let mut events = sample();
        events.push(RatingEvent {
            bgg_id: 99,
            rating: 10.0,
            timestamp: end() + Duration::days(1),
        });
        events.push(RatingEvent {
            bgg_id: 98,
            rating: 10.0,
            timestamp: end() - Duration::days(40),
        });

        let charts = ChartsScorer::new(ChartsMode::Fixed { days: 30 }).calculate(&events, None, end());

        assert!(charts.iter().all(|c| c.bgg_id < 98));
    }

    #[test]
    fn test_empty_window() {
        let charts = ChartsScorer::new(ChartsMode::Fixed { days: 30 }).calculate(&[], None, end());
        assert!(charts.is_empty());
    }
}
