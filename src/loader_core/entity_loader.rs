//! Two-pass entity loader
//!
//! Pass 1 builds typed entities from mapped records and inserts them in
//! batches. Pass 2 re-reads the same records, creates the foreign entities
//! they reference and sets the relation sets of each source entity.

use super::mapping::{merge_missing, AddData, FieldMapping};
use crate::error::LoadError;
use crate::model::reference::{ids_in, references_in};
use crate::model::{Entity, EntityKey, EntityKind, NamedEntity, Relation};
use crate::report::LoadReport;
use crate::source::Record;
use crate::store::{set_relation, Persist, SqliteStore};
use rusqlite::Transaction;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Which record fields hold references, and the relation each one feeds
#[derive(Debug, Clone, Default)]
pub struct ReferenceSpec {
    /// Fields of `name:id` strings pointing at other entity kinds
    pub foreign: Vec<(String, Relation)>,
    /// Fields of ids pointing back at the same entity kind
    pub recursive: Vec<(String, Relation)>,
}

impl ReferenceSpec {
    pub fn is_empty(&self) -> bool {
        self.foreign.is_empty() && self.recursive.is_empty()
    }
}

/// New relation sets of one source entity
pub type RelationUpdate = BTreeMap<Relation, Vec<i64>>;

/// Map one record onto its entity type, filling gaps from add-data
pub fn make_entity<E: Entity>(
    item: &Record,
    mapping: &FieldMapping,
    add_data: &AddData,
) -> Result<E, LoadError> {
    let mut data = mapping.apply(item);

    if let Some(extra) = E::key_in(&data).and_then(|key| add_data.get(&key)) {
        merge_missing(&mut data, extra);
    }

    serde_json::from_value(Value::Object(data))
        .map_err(|e| LoadError::MalformedRecord(format!("{}: {}", E::KIND, e)))
}

pub struct EntityLoader<'a> {
    store: &'a mut SqliteStore,
    batch_size: usize,
    dry_run: bool,
}

impl<'a> EntityLoader<'a> {
    pub fn new(store: &'a mut SqliteStore, batch_size: usize, dry_run: bool) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            dry_run,
        }
    }

    pub fn store(&mut self) -> &mut SqliteStore {
        &mut *self.store
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Pass 1: create one entity per parseable record
    pub fn create_entities<E, I>(
        &mut self,
        items: I,
        mapping: &FieldMapping,
        add_data: &AddData,
    ) -> LoadReport
    where
        E: Entity + Persist,
        I: IntoIterator<Item = Record>,
    {
        log::info!("🏗️  Creating {} entities", E::KIND);

        let mut report = LoadReport::new();
        let mut batch: Vec<E> = Vec::with_capacity(self.batch_size.min(10_000));
        let mut batch_no = 0;

        for item in items {
            if let Some(entity) = report.record(make_entity::<E>(&item, mapping, add_data)) {
                batch.push(entity);
            }

            if batch.len() >= self.batch_size {
                batch_no += 1;
                self.flush(&mut batch, batch_no, &mut report);
            }

            if report.processed % 10_000 == 0 {
                log::info!("   ├─ processed {} items so far", report.processed);
            }
        }

        if !batch.is_empty() {
            batch_no += 1;
            self.flush(&mut batch, batch_no, &mut report);
        }

        log::info!(
            "✅ {} entities done: {} processed, {} created, {} skipped",
            E::KIND,
            report.processed,
            report.created,
            report.skipped
        );
        report
    }

    /// Insert a batch in one transaction; a failed commit abandons the batch
    pub(crate) fn flush<P: Persist>(
        &mut self,
        batch: &mut Vec<P>,
        batch_no: usize,
        report: &mut LoadReport,
    ) {
        log::info!("📦 Processing batch #{} ({} rows)", batch_no, batch.len());

        if self.dry_run {
            batch.clear();
            return;
        }

        match self.store.write_batch(batch.as_slice()) {
            Ok(outcome) => {
                report.created += outcome.written;
                report.updated += outcome.updated;
                report.failed += outcome.failed;
                if outcome.kept > 0 {
                    log::debug!("   └─ {} rows already present", outcome.kept);
                }
            }
            Err(e) => {
                let err = LoadError::BatchWriteFailure(format!("batch #{}: {}", batch_no, e));
                log::error!("❌ {}", err);
                report.failed_batches += 1;
                report.failed += batch.len();
            }
        }

        batch.clear();
    }

    /// Write rows of any persistable type in batches
    pub fn write_all<P: Persist>(&mut self, rows: Vec<P>) -> LoadReport {
        let mut report = LoadReport::new();
        let mut batch = Vec::with_capacity(self.batch_size.min(rows.len()));
        let mut batch_no = 0;

        for row in rows {
            report.processed += 1;
            batch.push(row);
            if batch.len() >= self.batch_size {
                batch_no += 1;
                self.flush(&mut batch, batch_no, &mut report);
            }
        }

        if !batch.is_empty() {
            batch_no += 1;
            self.flush(&mut batch, batch_no, &mut report);
        }

        report
    }

    /// Pass 2: create referenced entities and set relation sets
    pub fn resolve_references<E: Entity>(
        &mut self,
        items: &[Record],
        spec: &ReferenceSpec,
    ) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::new();

        if spec.is_empty() {
            log::warn!("⚠️  No foreign or recursive references given, nothing to do");
            return Ok(report);
        }

        log::info!("🔗 Resolving references of {} {} records", items.len(), E::KIND);

        let existing = self.store.existing_ids(E::KIND)?;
        let resolution = collect_references::<E>(items, spec, &existing);
        report.processed = items.len();

        for (kind, names) in resolution.names {
            log::info!("   ├─ {} {} entities referenced", names.len(), kind);
            let entities = names
                .into_iter()
                .map(|(id, name)| NamedEntity::new(kind, id, name))
                .collect();
            let created = self.write_all::<NamedEntity>(entities);
            report.created += created.created;
            report.failed += created.failed;
            report.failed_batches += created.failed_batches;
        }

        log::info!(
            "   └─ {} {} entities to update",
            resolution.updates.len(),
            E::KIND
        );

        let updated = self.apply_updates(resolution.updates);
        report.merge(&updated);

        log::info!(
            "✅ References resolved: {} entities created, {} relation sets updated, {} failed",
            report.created,
            report.updated,
            report.failed
        );
        Ok(report)
    }

    /// Apply relation updates batch by batch; each update gets its own
    /// savepoint so one failure leaves the rest of the batch intact.
    pub fn apply_updates(&mut self, updates: Vec<(i64, RelationUpdate)>) -> LoadReport {
        let mut report = LoadReport::new();

        for (index, batch) in updates.chunks(self.batch_size).enumerate() {
            let batch_no = index + 1;
            log::info!("📦 Processing batch #{} ({} updates)", batch_no, batch.len());

            if self.dry_run {
                continue;
            }

            let outcome = self.store.in_transaction(|tx| {
                let mut tally = (0usize, 0usize);
                for (from_id, update) in batch {
                    match apply_update(tx, *from_id, update) {
                        Ok(()) => tally.0 += 1,
                        Err(e) => {
                            log::warn!("⚠️  Failed to update <{}> with {:?}: {}", from_id, update, e);
                            tally.1 += 1;
                        }
                    }
                }
                Ok(tally)
            });

            match outcome {
                Ok((updated, failed)) => {
                    report.updated += updated;
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

        report
    }
}

fn apply_update(
    tx: &mut Transaction<'_>,
    from_id: i64,
    update: &RelationUpdate,
) -> rusqlite::Result<()> {
    let sp = tx.savepoint()?;
    for (relation, to_ids) in update {
        set_relation(&sp, *relation, from_id, to_ids)?;
    }
    sp.commit()
}

/// Everything pass 2 has to write
#[derive(Debug, Default)]
pub struct Resolution {
    /// Canonical name per id, per referenced kind
    pub names: BTreeMap<EntityKind, BTreeMap<i64, String>>,
    /// Relation updates in record order
    pub updates: Vec<(i64, RelationUpdate)>,
}

/// Scan records once, accumulating referenced names and relation sets.
///
/// The canonical name of an id is the first one seen. Recursive ids are
/// filtered against `existing`; unknown ids are dropped.
pub fn collect_references<E: Entity>(
    items: &[Record],
    spec: &ReferenceSpec,
    existing: &HashSet<i64>,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for item in items {
        let mut update = RelationUpdate::new();

        for (field, relation) in &spec.foreign {
            let Some(value) = item.get(field) else { continue };
            let names = resolution.names.entry(relation.target()).or_default();
            for reference in references_in(value) {
                if let Ok((id, name)) = reference.resolved() {
                    names.entry(id).or_insert_with(|| name.to_string());
                    update.entry(*relation).or_default().push(id);
                }
            }
        }

        for (field, relation) in &spec.recursive {
            let Some(value) = item.get(field) else { continue };
            let ids: Vec<i64> = ids_in(value)
                .into_iter()
                .filter(|id| existing.contains(id))
                .collect();
            if !ids.is_empty() {
                update.insert(*relation, ids);
            }
        }

        for ids in update.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        let pkey = match E::key_in(item) {
            Some(EntityKey::Id(id)) if id != 0 => id,
            _ => continue,
        };

        if update.values().any(|ids| !ids.is_empty()) {
            match positions.get(&pkey) {
                Some(&pos) => resolution.updates[pos].1 = update,
                None => {
                    positions.insert(pkey, resolution.updates.len());
                    resolution.updates.push((pkey, update));
                }
            }
        }
    }

    resolution.names.retain(|_, names| !names.is_empty());
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Game;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn spec() -> ReferenceSpec {
        ReferenceSpec {
            foreign: vec![("designer".to_string(), Relation::Designer)],
            recursive: vec![("implementation".to_string(), Relation::Implements)],
        }
    }

    #[test]
    fn test_make_entity_merges_add_data() {
        let mapping = FieldMapping::keep_all();
        let mut add_data = AddData::new();
        add_data.insert(
            EntityKey::Id(13),
            json!({"rec_rank": 4, "name": "Ignored"}).as_object().unwrap().clone(),
        );

        let item = json!({"bgg_id": 13, "name": "Catan"}).as_object().unwrap().clone();
        let game: Game = make_entity(&item, &mapping, &add_data).unwrap();

        assert_eq!(game.name, "Catan");
        assert_eq!(game.rec_rank, Some(4));
    }

    #[test]
    fn test_make_entity_rejects_missing_key() {
        let item = json!({"name": "No id"}).as_object().unwrap().clone();
        let outcome = make_entity::<Game>(&item, &FieldMapping::keep_all(), &AddData::new());

        assert!(matches!(outcome, Err(LoadError::MalformedRecord(_))));
    }

    #[test]
    fn test_first_seen_name_wins() {
        let items = records(vec![
            json!({"bgg_id": 1, "designer": ["Alice:5", "Bob:7"]}),
            json!({"bgg_id": 2, "designer": "Alicia:5"}),
        ]);

        let resolution = collect_references::<Game>(&items, &spec(), &HashSet::new());
        let persons = &resolution.names[&EntityKind::Person];

        assert_eq!(persons[&5], "Alice");
        assert_eq!(persons[&7], "Bob");
        assert_eq!(resolution.updates.len(), 2);
        assert_eq!(resolution.updates[0].1[&Relation::Designer], vec![5, 7]);
    }

    #[test]
    fn test_unresolvable_references_produce_no_update() {
        let items = records(vec![
            json!({"bgg_id": 1, "designer": ["Nameless", ":9"]}),
            json!({"bgg_id": 2, "implementation": [99]}),
        ]);

        let resolution = collect_references::<Game>(&items, &spec(), &HashSet::new());

        assert!(resolution.updates.is_empty());
        assert!(resolution.names.is_empty());
    }

    #[test]
    fn test_recursive_ids_filtered_and_sorted() {
        let items = records(vec![json!({"bgg_id": 1, "implementation": [9, 3, "4", 42, 3]})]);
        let existing: HashSet<i64> = [1, 3, 4, 9].into_iter().collect();

        let resolution = collect_references::<Game>(&items, &spec(), &existing);

        assert_eq!(resolution.updates, vec![(1, RelationUpdate::from([(Relation::Implements, vec![3, 4, 9])]))]);
    }

    #[test]
    fn test_resolve_references_creates_and_links() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let items = records(vec![
            json!({"bgg_id": 1, "name": "One", "designer": "Alice:5,Bob:7", "implementation": [2]}),
            json!({"bgg_id": 2, "name": "Two", "designer": "Alice:5"}),
        ]);

        let mut loader = EntityLoader::new(&mut store, 1, false);
        loader.create_entities::<Game, _>(items.clone(), &FieldMapping::keep_all(), &AddData::new());
        let report = loader.resolve_references::<Game>(&items, &spec()).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(store.relation_targets(Relation::Designer, 1).unwrap(), vec![5, 7]);
        assert_eq!(store.relation_targets(Relation::Implements, 1).unwrap(), vec![2]);
        assert_eq!(store.relation_targets(Relation::Designer, 2).unwrap(), vec![5]);
    }

    #[test]
    fn test_failing_update_is_isolated() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let items = records(vec![json!({"bgg_id": 1, "name": "One"})]);

        let mut loader = EntityLoader::new(&mut store, 10, false);
        loader.create_entities::<Game, _>(items, &FieldMapping::keep_all(), &AddData::new());

        let updates = vec![
            // game 404 does not exist
            (404, RelationUpdate::from([(Relation::Implements, vec![1])])),
            (1, RelationUpdate::from([(Relation::Implements, vec![1])])),
        ];
        let report = loader.apply_updates(updates);

        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(store.relation_targets(Relation::Implements, 1).unwrap(), vec![1]);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let items = records(vec![json!({"bgg_id": 1, "name": "One"})]);

        let mut loader = EntityLoader::new(&mut store, 10, true);
        let report = loader.create_entities::<Game, _>(items, &FieldMapping::keep_all(), &AddData::new());

        assert_eq!(report.processed, 1);
        assert_eq!(report.created, 0);
        assert_eq!(store.count(EntityKind::Game).unwrap(), 0);
    }
}
