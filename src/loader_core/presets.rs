//! Field mappings and reference fields of the scraped game, collection and
//! user records

use super::entity_loader::ReferenceSpec;
use super::links::LinkIndex;
use super::mapping::FieldMapping;
use crate::dates::datetime_from_value;
use crate::model::de::is_truthy;
use crate::model::reference::{id_from_value, references_in};
use crate::model::Relation;
use serde_json::{json, Value};

/// BoardGameArena family id
pub const FAMILY_ID_BGA: i64 = 70360;

pub const GAME_FIELDS: [&str; 35] = [
    "alt_name",
    "avg_rating",
    "bayes_rating",
    "bgg_id",
    "bgg_rank",
    "compilation",
    "complexity",
    "cooperative",
    "created_at",
    "description",
    "external_link",
    "image_url",
    "language_dependency",
    "max_age",
    "max_age_rec",
    "max_players",
    "max_players_best",
    "max_players_rec",
    "max_time",
    "min_age",
    "min_age_rec",
    "min_players",
    "min_players_best",
    "min_players_rec",
    "min_time",
    "modified_at",
    "name",
    "num_votes",
    "rec_rank",
    "rec_rating",
    "scraped_at",
    "stddev_rating",
    "url",
    "video_url",
    "year",
];

fn lower_user_name(item: &crate::source::Record) -> Value {
    item.get("bgg_user_name")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .filter(|name| !name.is_empty())
        .map_or(Value::Null, Value::String)
}

/// `[].blurhash` of the scraped image list
fn blurhashes(value: &Value) -> Value {
    match value {
        Value::Array(images) => Value::Array(
            images
                .iter()
                .filter_map(|image| image.get("blurhash"))
                .filter(|hash| !hash.is_null())
                .cloned()
                .collect(),
        ),
        _ => Value::Null,
    }
}

pub fn game_mapping(links: Option<LinkIndex>) -> FieldMapping {
    let mapping = FieldMapping::allow(GAME_FIELDS)
        .rename("rank", "bgg_rank")
        .transform("image_blurhash", blurhashes)
        .derive("available_on_bga", |item| {
            let on_bga = item.get("family").map_or(false, |families| {
                references_in(families)
                    .iter()
                    .any(|family| family.id == Some(FAMILY_ID_BGA))
            });
            Value::Bool(on_bga)
        });

    match links {
        Some(links) if !links.is_empty() => mapping.derive("linked_ids", move |item| {
            let linked = item
                .get("bgg_id")
                .and_then(id_from_value)
                .map(|id| links.linked_ids(id))
                .unwrap_or_default();
            json!(linked)
        }),
        _ => mapping,
    }
}

pub fn game_references() -> ReferenceSpec {
    let field = |name: &str, relation| (name.to_string(), relation);
    ReferenceSpec {
        foreign: vec![
            field("artist", Relation::Artist),
            field("category", Relation::Category),
            field("designer", Relation::Designer),
            field("game_type", Relation::GameType),
            field("mechanic", Relation::Mechanic),
        ],
        recursive: vec![
            field("compilation_of", Relation::CompilationOf),
            field("implementation", Relation::Implements),
            field("integration", Relation::IntegratesWith),
        ],
    }
}

pub fn collection_mapping() -> FieldMapping {
    FieldMapping::allow(Vec::<String>::new())
        .rename("bgg_id", "game_id")
        .rename("bgg_user_rating", "rating")
        .rename("bgg_user_wishlist", "wishlist")
        .rename("bgg_user_play_count", "play_count")
        .derive("user_id", lower_user_name)
        .derive("owned", |item| {
            let owned = ["bgg_user_owned", "bgg_user_prev_owned", "bgg_user_preordered"]
                .iter()
                .any(|field| item.get(*field).map_or(false, is_truthy));
            Value::Bool(owned)
        })
}

pub fn user_mapping() -> FieldMapping {
    FieldMapping::allow(Vec::<String>::new())
        .transform("updated_at", |value| {
            datetime_from_value(value).map_or(Value::Null, |dt| Value::String(dt.to_rfc3339()))
        })
        .derive("name", lower_user_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader_core::entity_loader::make_entity;
    use crate::loader_core::mapping::AddData;
    use crate::model::{Collection, Game, LinkedId, User};

    fn record(value: Value) -> crate::source::Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_game_mapping() {
        let links = LinkIndex::from_value(&json!({"bgg:13": ["luding:4"]}));
        let mapping = game_mapping(Some(links));

        let item = record(json!({
            "bgg_id": 13,
            "name": "Catan",
            "rank": 400,
            "designer": ["Klaus Teuber:11"],
            "family": ["Admin: Better Description Needed!:1", "Digital: BoardGameArena:70360"],
            "image_blurhash": [{"blurhash": "LEHV6n"}, {"url": "x"}],
        }));
        let game: Game = make_entity(&item, &mapping, &AddData::new()).unwrap();

        assert_eq!(game.bgg_rank, Some(400));
        assert!(game.available_on_bga);
        assert_eq!(game.image_blurhash, vec!["LEHV6n"]);
        assert_eq!(game.linked_ids["luding"], vec![LinkedId::Int(4)]);
    }

    #[test]
    fn test_collection_mapping() {
        let item = record(json!({
            "bgg_id": 13,
            "bgg_user_name": "Markus",
            "bgg_user_rating": 8,
            "bgg_user_owned": false,
            "bgg_user_prev_owned": true,
            "bgg_user_play_count": 3,
        }));
        let row: Collection = make_entity(&item, &collection_mapping(), &AddData::new()).unwrap();

        assert_eq!(row.game_id, 13);
        assert_eq!(row.user_id.as_deref(), Some("markus"));
        assert_eq!(row.rating, Some(8.0));
        assert!(row.owned);
        assert_eq!(row.play_count, 3);
    }

    #[test]
    fn test_user_mapping() {
        let item = record(json!({"bgg_user_name": "Markus", "updated_at": "2021-03-04T05:06:07"}));
        let user: User = make_entity(&item, &user_mapping(), &AddData::new()).unwrap();

        assert_eq!(user.name, "markus");
        assert!(user.updated_at.is_some());

        let nameless = record(json!({"updated_at": "2021-03-04"}));
        assert!(make_entity::<User>(&nameless, &user_mapping(), &AddData::new()).is_err());
    }
}
