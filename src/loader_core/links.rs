//! Cross-site link index
//!
//! The link file maps `"<site>:<id>"` to a list of `"<site>:<id>"` strings
//! naming the same game on other sites.

use crate::error::LoadError;
use crate::model::LinkedId;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Sites whose ids are attached to games
pub const LINKED_SITES: [&str; 6] = [
    "freebase",
    "wikidata",
    "wikipedia",
    "dbpedia",
    "luding",
    "spielen",
];

/// Split `"<site>:<id>"`; the site is lower-case letters, the id an
/// integer when it parses as one.
pub fn parse_link_id(value: &str) -> Option<(String, LinkedId)> {
    let (site, id) = value.split_once(':')?;
    if site.is_empty() || !site.bytes().all(|b| b.is_ascii_lowercase()) || id.is_empty() {
        return None;
    }

    let id = match id.parse::<i64>() {
        Ok(number) => LinkedId::Int(number),
        Err(_) => LinkedId::Text(id.to_string()),
    };
    Some((site.to_string(), id))
}

#[derive(Debug, Default, Clone)]
pub struct LinkIndex {
    links: HashMap<i64, BTreeMap<String, Vec<LinkedId>>>,
}

impl LinkIndex {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        log::info!("📖 Loading links from <{}>", path.display());
        let file = File::open(path).map_err(|e| LoadError::source_unavailable(path, e))?;
        let data: Value = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::from_value(&data))
    }

    pub fn from_value(data: &Value) -> Self {
        let mut links: HashMap<i64, BTreeMap<String, Vec<LinkedId>>> = HashMap::new();

        let Some(entries) = data.as_object() else {
            log::warn!("⚠️  Link data is not an object, ignoring it");
            return Self { links };
        };

        for (origin, targets) in entries {
            let Some((_, LinkedId::Int(origin_id))) = parse_link_id(origin) else {
                continue;
            };

            let targets: Vec<&str> = match targets {
                Value::String(s) => vec![s.as_str()],
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };

            for (site, id) in targets.into_iter().filter_map(parse_link_id) {
                links
                    .entry(origin_id)
                    .or_default()
                    .entry(site)
                    .or_default()
                    .push(id);
            }
        }

        log::info!("✅ Found links for {} items", links.len());
        Self { links }
    }

    /// Linked ids of one game, restricted to [`LINKED_SITES`]
    pub fn linked_ids(&self, bgg_id: i64) -> BTreeMap<String, Vec<LinkedId>> {
        self.links
            .get(&bgg_id)
            .map(|sites| {
                sites
                    .iter()
                    .filter(|(site, _)| LINKED_SITES.contains(&site.as_str()))
                    .map(|(site, ids)| (site.clone(), ids.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
