//! Record-to-entity field mapping
//!
//! A [`FieldMapping`] turns one scraped record into the field map of a typed
//! entity:
//! 1. keep the allow-listed fields (or everything),
//! 2. apply the per-field rules in declaration order: a rename only fills a
//!    missing target from a truthy source, a transform rewrites a truthy
//!    field in place,
//! 3. set derived fields computed from the whole record.
//!
//! Rules always read the original record, never the partially mapped one.

use crate::model::de::is_truthy;
use crate::model::EntityKey;
use crate::source::Record;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub type Transform = Box<dyn Fn(&Value) -> Value>;
pub type Derive = Box<dyn Fn(&Record) -> Value>;

/// Extra fields per primary key, merged without overwriting mapped ones
pub type AddData = HashMap<EntityKey, Record>;

enum FieldRule {
    Rename(String),
    Transform(Transform),
}

#[derive(Default)]
pub struct FieldMapping {
    fields: Option<HashSet<String>>,
    rules: Vec<(String, FieldRule)>,
    derived: Vec<(String, Derive)>,
}

impl FieldMapping {
    /// Start from every field of the record
    pub fn keep_all() -> Self {
        Self::default()
    }

    /// Start from the listed fields only; an empty list keeps nothing
    pub fn allow<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.rules
            .push((from.to_string(), FieldRule::Rename(to.to_string())));
        self
    }

    pub fn transform<F>(mut self, field: &str, f: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.rules
            .push((field.to_string(), FieldRule::Transform(Box::new(f))));
        self
    }

    pub fn derive<F>(mut self, field: &str, f: F) -> Self
    where
        F: Fn(&Record) -> Value + 'static,
    {
        self.derived.push((field.to_string(), Box::new(f)));
        self
    }

    pub fn apply(&self, item: &Record) -> Record {
        let mut result: Record = match &self.fields {
            Some(fields) => item
                .iter()
                .filter(|(k, _)| fields.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => item.clone(),
        };

        for (from, rule) in &self.rules {
            let value = match item.get(from) {
                Some(value) if is_truthy(value) => value,
                _ => continue,
            };
            match rule {
                FieldRule::Rename(to) => {
                    result.entry(to.clone()).or_insert_with(|| value.clone());
                }
                FieldRule::Transform(f) => {
                    result.insert(from.clone(), f(value));
                }
            }
        }

        for (field, f) in &self.derived {
            result.insert(field.clone(), f(item));
        }

        result
    }
}

/// Copy fields from `extra` that `record` does not have yet
pub fn merge_missing(record: &mut Record, extra: &Record) {
    for (key, value) in extra {
        record.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_allow_list_drops_unknown_fields() {
        let mapping = FieldMapping::allow(["bgg_id", "name"]);
        let mapped = mapping.apply(&record(json!({"bgg_id": 1, "name": "X", "junk": true})));

        assert_eq!(Value::Object(mapped), json!({"bgg_id": 1, "name": "X"}));
    }

    #[test]
    fn test_rename_only_fills_missing_target() {
        let mapping = FieldMapping::allow(["bgg_rank"]).rename("rank", "bgg_rank");

        let mapped = mapping.apply(&record(json!({"rank": 5})));
        assert_eq!(mapped["bgg_rank"], json!(5));

        let mapped = mapping.apply(&record(json!({"rank": 5, "bgg_rank": 3})));
        assert_eq!(mapped["bgg_rank"], json!(3));

        // falsy sources are ignored
        let mapped = mapping.apply(&record(json!({"rank": 0})));
        assert!(!mapped.contains_key("bgg_rank"));
    }

    #[test]
    fn test_transform_bypasses_allow_list() {
        let mapping = FieldMapping::allow(Vec::<String>::new())
            .transform("name", |v| json!(v.as_str().map(str::to_uppercase)));

        let mapped = mapping.apply(&record(json!({"name": "catan", "year": 1995})));

        assert_eq!(Value::Object(mapped), json!({"name": "CATAN"}));
    }

    #[test]
    fn test_derived_fields_see_original_record() {
        let mapping = FieldMapping::allow(Vec::<String>::new())
            .rename("bgg_id", "game_id")
            .derive("double", |item| json!(item["bgg_id"].as_i64().map(|id| id * 2)));

        let mapped = mapping.apply(&record(json!({"bgg_id": 21})));

        assert_eq!(mapped["game_id"], json!(21));
        assert_eq!(mapped["double"], json!(42));
        assert!(!mapped.contains_key("bgg_id"));
    }

    #[test]
    fn test_merge_missing_never_overwrites() {
        let mut mapped = record(json!({"rec_rank": 1}));
        merge_missing(&mut mapped, &record(json!({"rec_rank": 9, "rec_rating": 8.5})));

        assert_eq!(Value::Object(mapped), json!({"rec_rank": 1, "rec_rating": 8.5}));
    }
}
