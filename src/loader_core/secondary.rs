//! Owner entities derived from grouped child records
//!
//! Child records (collection rows) arrive grouped by owner (user). Every
//! time the owner changes, one owner entity is emitted right before the run
//! of its children.

use super::entity_loader::{make_entity, EntityLoader};
use super::mapping::{AddData, FieldMapping};
use crate::error::LoadError;
use crate::model::{Collection, Entity};
use crate::report::LoadReport;
use crate::source::Record;
use crate::store::{insert_rows, Persist};
use std::collections::HashSet;

/// A child entity that names its owner
pub trait OwnedBy {
    fn owner_key(&self) -> Option<&str>;

    /// Reduced payload for owners outside the premium allow-list
    fn minimal(self) -> Self;
}

impl OwnedBy for Collection {
    fn owner_key(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn minimal(self) -> Self {
        Collection::minimal(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryItem<O, C> {
    Owner(O),
    Child(C),
}

/// Iterator adapter interleaving owners with their children
pub struct SecondaryItems<I, C, O, F>
where
    I: Iterator<Item = C>,
{
    children: I,
    make_owner: F,
    premium: HashSet<String>,
    current: Option<String>,
    seen: HashSet<String>,
    pending: Option<C>,
    _owner: std::marker::PhantomData<O>,
}

impl<I, C, O, F> SecondaryItems<I, C, O, F>
where
    I: Iterator<Item = C>,
    C: OwnedBy,
    F: FnMut(&str) -> O,
{
    /// An empty `premium` set means every owner gets full child rows
    pub fn new(children: I, make_owner: F, premium: HashSet<String>) -> Self {
        if !premium.is_empty() {
            log::info!(
                "👑 Including full collection info only for {} premium user(s)",
                premium.len()
            );
        }

        Self {
            children,
            make_owner,
            premium,
            current: None,
            seen: HashSet::new(),
            pending: None,
            _owner: std::marker::PhantomData,
        }
    }

    fn restrict(&self, child: C) -> C {
        if self.premium.is_empty() {
            return child;
        }
        let listed = child
            .owner_key()
            .map_or(false, |key| self.premium.contains(key));
        if listed {
            child
        } else {
            child.minimal()
        }
    }
}

impl<I, C, O, F> Iterator for SecondaryItems<I, C, O, F>
where
    I: Iterator<Item = C>,
    C: OwnedBy,
    F: FnMut(&str) -> O,
{
    type Item = SecondaryItem<O, C>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(child) = self.pending.take() {
            return Some(SecondaryItem::Child(self.restrict(child)));
        }

        let child = self.children.next()?;
        let key = child.owner_key().filter(|k| !k.is_empty()).map(str::to_string);

        if key != self.current {
            self.current = key.clone();

            if let Some(key) = key {
                if self.seen.insert(key.clone()) {
                    let owner = (self.make_owner)(&key);
                    self.pending = Some(child);
                    return Some(SecondaryItem::Owner(owner));
                }
                log::warn!("⚠️  Owner <{}> seen again, input is not grouped by owner", key);
            }
        }

        Some(SecondaryItem::Child(self.restrict(child)))
    }
}

impl<'a> EntityLoader<'a> {
    /// Create children and their owners; each batch writes owners before
    /// children inside one transaction.
    pub fn create_with_owners<C, O, I, F>(
        &mut self,
        items: I,
        mapping: &FieldMapping,
        make_owner: F,
        premium: HashSet<String>,
    ) -> LoadReport
    where
        C: Entity + Persist + OwnedBy,
        O: Persist,
        I: IntoIterator<Item = Record>,
        F: FnMut(&str) -> O,
    {
        log::info!("🏗️  Creating {} entities with owners", C::KIND);

        let mut parsed = LoadReport::new();
        let mut report = LoadReport::new();
        let no_add_data = AddData::new();

        let children = items
            .into_iter()
            .filter_map(|item| parsed.record(make_entity::<C>(&item, mapping, &no_add_data)));
        let generated = SecondaryItems::new(children, make_owner, premium);

        let mut owners: Vec<O> = Vec::new();
        let mut rows: Vec<C> = Vec::new();
        let mut batch_no = 0;

        for item in generated {
            match item {
                SecondaryItem::Owner(owner) => owners.push(owner),
                SecondaryItem::Child(child) => rows.push(child),
            }

            if owners.len() + rows.len() >= self.batch_size() {
                batch_no += 1;
                self.flush_mixed(&mut owners, &mut rows, batch_no, &mut report);
            }
        }

        if !owners.is_empty() || !rows.is_empty() {
            batch_no += 1;
            self.flush_mixed(&mut owners, &mut rows, batch_no, &mut report);
        }

        report.merge(&parsed);
        log::info!(
            "✅ {} entities done: {} processed, {} created, {} skipped",
            C::KIND,
            report.processed,
            report.created,
            report.skipped
        );
        report
    }

    fn flush_mixed<O: Persist, C: Persist>(
        &mut self,
        owners: &mut Vec<O>,
        children: &mut Vec<C>,
        batch_no: usize,
        report: &mut LoadReport,
    ) {
        log::info!(
            "📦 Processing batch #{} ({} owners, {} children)",
            batch_no,
            owners.len(),
            children.len()
        );

        if !self.is_dry_run() {
            let outcome = self.store().in_transaction(|tx| {
                let mut outcome = insert_rows(tx, owners.as_slice());
                outcome.merge(insert_rows(tx, children.as_slice()));
                Ok(outcome)
            });

            match outcome {
                Ok(outcome) => {
                    report.created += outcome.written;
                    report.updated += outcome.updated;
                    report.failed += outcome.failed;
                }
                Err(e) => {
                    let err = LoadError::BatchWriteFailure(format!("batch #{}: {}", batch_no, e));
                    log::error!("❌ {}", err);
                    report.failed_batches += 1;
                    report.failed += owners.len() + children.len();
                }
            }
        }

        owners.clear();
        children.clear();
    }
}
