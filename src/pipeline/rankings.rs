//! Aggregate ranking snapshot directories into the `rankings` table

use crate::error::LoadError;
use crate::loader_core::EntityLoader;
use crate::model::{EntityKind, RankingType};
use crate::ranking_core::{AggregatorOptions, RankingAggregator};
use crate::report::LoadReport;
use crate::store::SqliteStore;
use std::path::Path;

/// Aggregate `<root>/<sub_dir>` for every requested ranking type
///
/// A missing or unreadable type directory is logged and skipped. The run
/// fails on store errors, or when none of the type directories can be read.
pub fn run_rankings(
    store: &mut SqliteStore,
    root: &Path,
    types: &[RankingType],
    options: &AggregatorOptions,
    batch_size: usize,
    dry_run: bool,
) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::new();
    let known_ids = store.existing_ids(EntityKind::Game)?;
    log::info!("📊 {} games known to the store", known_ids.len());

    let mut loader = EntityLoader::new(store, batch_size, dry_run);
    let mut aggregated_types = 0;

    for &ranking_type in types {
        let dir = root.join(ranking_type.sub_dir());
        let mut aggregator = match RankingAggregator::new(&dir, ranking_type, options, Some(&known_ids)) {
            Ok(aggregator) => aggregator,
            Err(e) => {
                log::error!("❌ Skipping {} rankings: {}", ranking_type, e);
                report.unavailable_sources += 1;
                continue;
            }
        };

        aggregated_types += 1;

        let mut written = LoadReport::new();
        for records in aggregator.by_ref() {
            written.merge(&loader.write_all(records));
        }

        // rows read come from the aggregator, rows written from the loader
        written.processed = 0;
        report.merge(aggregator.report());
        report.merge(&written);
        log::info!(
            "✅ {} rankings done: {} rows created, {} updated",
            ranking_type,
            written.created,
            written.updated
        );
    }

    if aggregated_types == 0 && !types.is_empty() {
        return Err(LoadError::source_unavailable(
            root,
            "no readable ranking directory",
        ));
    }

    report.log_summary("fillrankingdb");
    Ok(report)
}
