//! Typed domain entities
//!
//! Loader records are converted into these structs right after field mapping;
//! nothing downstream sees an untyped map.

pub mod de;
pub mod game;
pub mod named;
pub mod ranking;
pub mod reference;
pub mod relation;
pub mod user;

pub use game::{Game, LinkedId};
pub use named::NamedEntity;
pub use ranking::{RankingRecord, RankingType, ReductionPolicy};
pub use reference::ForeignReference;
pub use relation::Relation;
pub use user::{Collection, User};

use crate::source::Record;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Game,
    Person,
    Category,
    Mechanic,
    GameType,
    User,
    Collection,
    Ranking,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Game => "Game",
            EntityKind::Person => "Person",
            EntityKind::Category => "Category",
            EntityKind::Mechanic => "Mechanic",
            EntityKind::GameType => "GameType",
            EntityKind::User => "User",
            EntityKind::Collection => "Collection",
            EntityKind::Ranking => "Ranking",
        }
    }

    /// Backing table
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Game => "games",
            EntityKind::Person => "persons",
            EntityKind::Category => "categories",
            EntityKind::Mechanic => "mechanics",
            EntityKind::GameType => "game_types",
            EntityKind::User => "users",
            EntityKind::Collection => "collections",
            EntityKind::Ranking => "rankings",
        }
    }

    /// Primary key column
    pub fn key_column(&self) -> &'static str {
        match self {
            EntityKind::User => "name",
            EntityKind::Collection | EntityKind::Ranking => "id",
            _ => "bgg_id",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary key value of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Id(i64),
    Name(String),
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "{}", id),
            EntityKey::Name(name) => f.write_str(name),
        }
    }
}

/// An entity the loader can build from a mapped record
pub trait Entity: DeserializeOwned {
    const KIND: EntityKind;

    /// Field of the mapped record holding the primary key
    const PRIMARY_KEY: &'static str;

    /// Primary key, `None` for rows with a surrogate key
    fn key(&self) -> Option<EntityKey>;

    /// Primary key as found in a mapped record, used for add-data lookups
    fn key_in(record: &Record) -> Option<EntityKey> {
        record
            .get(Self::PRIMARY_KEY)
            .and_then(reference::id_from_value)
            .map(EntityKey::Id)
    }
}
