//! Load scraped games, references, clusters, users and collections
//!
//! Phases, in order:
//! 1. Games (with recommender add-data and cross-site links)
//! 2. Foreign and recursive references of the games
//! 3. Cluster edges from the recommender
//! 4. Collections with their users, or plain users when no collections are given

use crate::config::LoadConfig;
use crate::error::LoadError;
use crate::loader_core::presets::{collection_mapping, game_mapping, game_references, user_mapping};
use crate::loader_core::{load_premium_users, make_entity, AddData, EntityLoader, LinkIndex};
use crate::model::reference::id_from_value;
use crate::model::{Collection, Game, User};
use crate::recommender::{recommendation_add_data, Recommender};
use crate::report::LoadReport;
use crate::source::{Record, RecordReader};
use crate::store::SqliteStore;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Run every load phase; fails only when no game source is readable or the
/// store itself breaks
pub fn run_filldb(
    store: &mut SqliteStore,
    config: &LoadConfig,
    game_paths: &[PathBuf],
    recommender: &dyn Recommender,
) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::new();

    let mut reader = RecordReader::new(game_paths, config.in_format);
    let items: Vec<Record> = reader.by_ref().collect();
    report.merge(reader.report());
    if reader.readable_sources() == 0 {
        return Err(LoadError::source_unavailable(
            game_paths.first().cloned().unwrap_or_default(),
            "no readable game source",
        ));
    }
    log::info!("📊 Loaded {} game records", items.len());

    let add_data = match recommender.recommendations() {
        Ok(recommendations) => recommendation_add_data(&recommendations),
        Err(e) => {
            log::error!("❌ No recommendations from {} recommender: {}", recommender.name(), e);
            report.unavailable_sources += 1;
            AddData::new()
        }
    };

    let links = match &config.links_path {
        Some(path) => match LinkIndex::load(path) {
            Ok(links) => Some(links),
            Err(e) => {
                log::error!("❌ {}", e);
                report.unavailable_sources += 1;
                None
            }
        },
        None => None,
    };

    let mut loader = EntityLoader::new(store, config.batch_size, config.dry_run);

    let games = loader.create_entities::<Game, _>(items.iter().cloned(), &game_mapping(links), &add_data);
    report.merge(&games);
    drop(add_data);

    let references = loader.resolve_references::<Game>(&items, &game_references())?;
    report.merge(&references);

    let clusters = match recommender.clusters() {
        Ok(clusters) => clusters,
        Err(e) => {
            log::error!("❌ No clusters from {} recommender: {}", recommender.name(), e);
            report.unavailable_sources += 1;
            Vec::new()
        }
    };
    let linked = loader.link_clusters(&clusters)?;
    report.merge(&linked);

    if !config.collection_paths.is_empty() {
        let game_ids: HashSet<i64> = items
            .iter()
            .filter_map(|item| item.get("bgg_id").and_then(id_from_value))
            .collect();
        drop(items);

        let mut users = load_users(config, &mut report);
        let premium = load_premium_users(&config.premium_user_dirs, &config.premium_user_paths);

        let mut reader = RecordReader::new(&config.collection_paths, config.in_format);
        let children = reader.by_ref().filter(|item| {
            item.get("bgg_id")
                .and_then(id_from_value)
                .map_or(false, |id| game_ids.contains(&id))
        });

        let collections = loader.create_with_owners::<Collection, User, _, _>(
            children,
            &collection_mapping(),
            |name: &str| users.remove(name).unwrap_or_else(|| User::bare(name)),
            premium,
        );
        report.merge(&collections);
        report.merge(reader.report());
    } else if !config.user_paths.is_empty() {
        let mut reader = RecordReader::new(&config.user_paths, config.in_format);
        let users = loader.create_entities::<User, _>(reader.by_ref(), &user_mapping(), &AddData::new());
        report.merge(&users);
        report.merge(reader.report());
    }

    report.log_summary("filldb");
    Ok(report)
}

/// Users keyed by their lower-cased name
fn load_users(config: &LoadConfig, report: &mut LoadReport) -> HashMap<String, User> {
    if config.user_paths.is_empty() {
        return HashMap::new();
    }

    let mapping = user_mapping();
    let no_add_data = AddData::new();
    let mut reader = RecordReader::new(&config.user_paths, config.in_format);

    let mut users = HashMap::new();
    for item in reader.by_ref() {
        match make_entity::<User>(&item, &mapping, &no_add_data) {
            Ok(user) => {
                users.insert(user.name.clone(), user);
            }
            Err(e) => {
                log::warn!("⚠️  Skipping user record: {}", e);
                report.skipped += 1;
            }
        }
    }

    report.merge(reader.report());
    log::info!("📊 Loaded details of {} users", users.len());
    users
}
