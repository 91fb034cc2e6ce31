//! Pairwise cluster edges from recommender groups

use super::entity_loader::EntityLoader;
use crate::error::LoadError;
use crate::model::{EntityKind, Relation};
use crate::report::LoadReport;
use crate::store::add_edge;
use std::collections::HashSet;

/// Every 2-combination within each group whose endpoints both exist
pub fn cluster_pairs<'a>(
    clusters: &'a [Vec<i64>],
    existing: &'a HashSet<i64>,
) -> impl Iterator<Item = (i64, i64)> + 'a {
    clusters.iter().flat_map(move |group| {
        group.iter().enumerate().flat_map(move |(i, &a)| {
            group[i + 1..]
                .iter()
                .map(move |&b| (a, b))
                .filter(move |&(a, b)| a != b && existing.contains(&a) && existing.contains(&b))
        })
    })
}

impl<'a> EntityLoader<'a> {
    /// Store the cluster relation from recommender groups
    pub fn link_clusters(&mut self, clusters: &[Vec<i64>]) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::new();

        if clusters.is_empty() {
            log::info!("📊 No clusters to link");
            return Ok(report);
        }

        log::info!("🔗 Linking {} clusters", clusters.len());

        let existing = self.store().existing_ids(EntityKind::Game)?;
        let pairs: Vec<(i64, i64)> = cluster_pairs(clusters, &existing).collect();
        let batch_size = self.batch_size();

        for (index, batch) in pairs.chunks(batch_size).enumerate() {
            let batch_no = index + 1;
            log::info!("📦 Processing batch #{} ({} pairs)", batch_no, batch.len());
            report.processed += batch.len();

            if self.is_dry_run() {
                continue;
            }

            let outcome = self.store().in_transaction(|tx| {
                let mut tally = (0usize, 0usize);
                for &(a, b) in batch {
                    match add_edge(tx, Relation::Cluster, a, b) {
                        Ok(written) => tally.0 += written,
                        Err(e) => {
                            log::warn!("⚠️  Failed to link <{}> and <{}>: {}", a, b, e);
                            tally.1 += 1;
                        }
                    }
                }
                Ok(tally)
            });

            match outcome {
                Ok((written, failed)) => {
                    report.updated += written;
                    report.failed += failed;
                }
                Err(e) => {
                    let err = LoadError::BatchWriteFailure(format!("batch #{}: {}", batch_no, e));
                    log::error!("❌ {}", err);
                    report.failed_batches += 1;
                    report.failed += batch.len();
                }
            }
        }

        log::info!("✅ Clusters linked: {} new edges", report.updated);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader_core::mapping::{AddData, FieldMapping};
    use crate::model::Game;
    use crate::store::SqliteStore;
    use serde_json::json;

    #[test]
    fn test_pairs_skip_missing_endpoints() {
        let clusters = vec![vec![1, 2, 3], vec![4, 5]];
        let existing: HashSet<i64> = [1, 2, 3, 4].into_iter().collect();

        let pairs: Vec<_> = cluster_pairs(&clusters, &existing).collect();

        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_link_clusters_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let games: Vec<_> = (1..=3)
            .map(|id| json!({"bgg_id": id, "name": format!("G{}", id)}).as_object().unwrap().clone())
            .collect();

        let mut loader = EntityLoader::new(&mut store, 2, false);
        loader.create_entities::<Game, _>(games, &FieldMapping::keep_all(), &AddData::new());

        let clusters = vec![vec![3, 1, 2], vec![2, 3]];
        let first = loader.link_clusters(&clusters).unwrap();
        let second = loader.link_clusters(&clusters).unwrap();

        assert_eq!(first.updated, 3);
        assert_eq!(second.updated, 0);
        assert_eq!(store.edge_count(Relation::Cluster).unwrap(), 3);
        assert_eq!(store.relation_targets(Relation::Cluster, 2).unwrap(), vec![1, 3]);
    }
}
