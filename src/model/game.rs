use super::de::{deserialize_flag, deserialize_string_list};
use super::{Entity, EntityKey, EntityKind};
use crate::dates::deserialize_option_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::{
    deserialize_default_from_null, deserialize_number_from_string,
    deserialize_option_number_from_string,
};
use std::collections::BTreeMap;

/// Id on an external site; most are integers, some are slugs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkedId {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub bgg_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub alt_name: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub year: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub image_url: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub image_blurhash: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub video_url: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub external_link: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_players: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_players: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_players_rec: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_players_rec: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_players_best: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_players_best: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_age: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_age: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_age_rec: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_age_rec: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_time: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_time: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub cooperative: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub compilation: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub available_on_bga: bool,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub bgg_rank: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub num_votes: i64,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub avg_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub stddev_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub bayes_rating: Option<f64>,

    // recommender output merged in from add-data
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub rec_rank: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub rec_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub rec_stars: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub complexity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub language_dependency: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub scraped_at: Option<DateTime<Utc>>,

    /// Ids of the same game on other sites, keyed by site
    #[serde(default)]
    pub linked_ids: BTreeMap<String, Vec<LinkedId>>,
}

impl Entity for Game {
    const KIND: EntityKind = EntityKind::Game;
    const PRIMARY_KEY: &'static str = "bgg_id";

    fn key(&self) -> Option<EntityKey> {
        Some(EntityKey::Id(self.bgg_id))
    }
}
