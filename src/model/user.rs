use super::de::deserialize_flag;
use super::{Entity, EntityKey, EntityKind};
use crate::dates::deserialize_option_datetime;
use crate::source::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::{
    deserialize_default_from_null, deserialize_number_from_string,
    deserialize_option_number_from_string,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// A user known only by name; names are stored lower-cased
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            updated_at: None,
        }
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    const PRIMARY_KEY: &'static str = "name";

    fn key(&self) -> Option<EntityKey> {
        Some(EntityKey::Name(self.name.clone()))
    }

    fn key_in(record: &Record) -> Option<EntityKey> {
        record
            .get(Self::PRIMARY_KEY)
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(|name| EntityKey::Name(name.to_lowercase()))
    }
}

/// One game in one user's collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub game_id: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub owned: bool,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub wishlist: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub play_count: i64,
}

impl Collection {
    /// Keep only the keys and the rating
    pub fn minimal(self) -> Self {
        Self {
            game_id: self.game_id,
            user_id: self.user_id,
            rating: self.rating,
            owned: false,
            wishlist: None,
            play_count: 0,
        }
    }
}

impl Entity for Collection {
    const KIND: EntityKind = EntityKind::Collection;
    const PRIMARY_KEY: &'static str = "id";

    fn key(&self) -> Option<EntityKey> {
        None
    }
}
