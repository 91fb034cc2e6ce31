//! Recommender output consumed by the loader
//!
//! The loader only needs a point-in-time snapshot: per game rank, score and
//! star rating, plus the cluster groups. Anything able to produce those can
//! implement [`Recommender`]; [`FileRecommender`] reads them from disk.

use crate::error::LoadError;
use crate::loader_core::AddData;
use crate::model::EntityKey;
use crate::ranking_core::{list_snapshots, read_rows};
use crate::stats::{percentile_buckets, star_rating};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const STAR_PERCENTILES: [f64; 8] = [0.165, 0.365, 0.615, 0.815, 0.915, 0.965, 0.985, 0.995];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub rank: u32,
    pub score: Option<f64>,
    pub stars: Option<f64>,
}

pub trait Recommender {
    fn name(&self) -> &'static str;

    /// Recommendation per game id
    fn recommendations(&self) -> Result<HashMap<i64, Recommendation>, LoadError>;

    /// Groups of game ids that belong together
    fn clusters(&self) -> Result<Vec<Vec<i64>>, LoadError>;
}

/// Reads the latest dated ranking CSV and a clusters JSON file
#[derive(Debug, Clone)]
pub struct FileRecommender {
    pub rankings_dir: Option<PathBuf>,
    pub clusters_path: Option<PathBuf>,
    pub star_percentiles: Vec<f64>,
}

impl FileRecommender {
    pub fn new(rankings_dir: Option<PathBuf>, clusters_path: Option<PathBuf>) -> Self {
        Self {
            rankings_dir,
            clusters_path,
            star_percentiles: STAR_PERCENTILES.to_vec(),
        }
    }

    pub fn with_star_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.star_percentiles = percentiles;
        self
    }

    fn latest_ranking(dir: &Path) -> Result<Option<PathBuf>, LoadError> {
        log::info!("🔍 Searching <{}> for latest ranking", dir.display());
        Ok(list_snapshots(dir)?
            .into_iter()
            .max_by_key(|(date, _)| *date)
            .map(|(_, path)| path))
    }
}

impl Recommender for FileRecommender {
    fn name(&self) -> &'static str {
        "file"
    }

    fn recommendations(&self) -> Result<HashMap<i64, Recommendation>, LoadError> {
        let Some(dir) = &self.rankings_dir else {
            return Ok(HashMap::new());
        };
        let Some(path) = Self::latest_ranking(dir)? else {
            log::warn!("⚠️  No dated ranking found in <{}>", dir.display());
            return Ok(HashMap::new());
        };

        log::info!("📖 Loading ranking from <{}>", path.display());
        let rows = read_rows(&path)?;

        let scores: Vec<f64> = rows.iter().filter_map(|row| row.score).collect();
        let buckets = percentile_buckets(&scores, &self.star_percentiles);

        let recommendations: HashMap<i64, Recommendation> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let recommendation = Recommendation {
                    rank: row.rank.unwrap_or(index as u32 + 1),
                    score: row.score,
                    stars: row.score.and_then(|s| star_rating(s, &buckets, 1.0, 5.0)),
                };
                (row.bgg_id, recommendation)
            })
            .collect();

        log::info!("✅ Loaded recommendations for {} games", recommendations.len());
        Ok(recommendations)
    }

    fn clusters(&self) -> Result<Vec<Vec<i64>>, LoadError> {
        let Some(path) = &self.clusters_path else {
            return Ok(Vec::new());
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| LoadError::source_unavailable(path, e))?;
        let clusters: Vec<Vec<i64>> = serde_json::from_str(&text)?;
        log::info!("✅ Loaded {} clusters from <{}>", clusters.len(), path.display());
        Ok(clusters)
    }
}

/// Extra game fields derived from the recommendations
pub fn recommendation_add_data(recommendations: &HashMap<i64, Recommendation>) -> AddData {
    recommendations
        .iter()
        .map(|(&bgg_id, rec)| {
            let mut data = Map::new();
            data.insert("rec_rank".to_string(), Value::from(rec.rank));
            if let Some(score) = rec.score.filter(|s| s.is_finite()) {
                data.insert("rec_rating".to_string(), Value::from(score));
            }
            if let Some(stars) = rec.stars {
                data.insert("rec_stars".to_string(), Value::from(stars));
            }
            (EntityKey::Id(bgg_id), data)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_latest_ranking_with_stars() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("20240101-000000.csv"),
            "rank,bgg_id,score\n1,99,1.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("20240201-000000.csv"),
            "rank,bgg_id,score\n1,13,9.0\n2,822,5.0\n3,9209,1.0\n",
        )
        .unwrap();

        let recommender = FileRecommender::new(Some(dir.path().to_path_buf()), None)
            .with_star_percentiles(vec![0.5]);
        let recs = recommender.recommendations().unwrap();

        assert_eq!(recs.len(), 3);
        assert!(!recs.contains_key(&99));
        assert_eq!(recs[&13].rank, 1);
        assert_eq!(recs[&13].stars, Some(5.0));
        assert_eq!(recs[&822].stars, Some(5.0));
        assert_eq!(recs[&9209].stars, Some(1.0));
    }

    #[test]
    fn test_clusters_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clusters.json");
        fs::write(&path, "[[1, 2, 3], [4, 5]]").unwrap();

        let recommender = FileRecommender::new(None, Some(path));

        assert_eq!(recommender.clusters().unwrap(), vec![vec![1, 2, 3], vec![4, 5]]);
        assert!(recommender.recommendations().unwrap().is_empty());
    }

    #[test]
    fn test_missing_clusters_file_is_unavailable() {
        let recommender = FileRecommender::new(None, Some(PathBuf::from("/no/such/clusters.json")));
        assert!(matches!(
            recommender.clusters(),
            Err(LoadError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_add_data_fields() {
        let mut recs = HashMap::new();
        recs.insert(13, Recommendation { rank: 4, score: Some(7.5), stars: None });

        let add_data = recommendation_add_data(&recs);
        let data = &add_data[&EntityKey::Id(13)];

        assert_eq!(data["rec_rank"], Value::from(4));
        assert_eq!(data["rec_rating"], Value::from(7.5));
        assert!(!data.contains_key("rec_stars"));
    }
}
