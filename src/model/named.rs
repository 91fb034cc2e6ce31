use super::EntityKind;

/// Person, Category, Mechanic or GameType: an id plus a display name.
///
/// These are only ever created from resolved foreign references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    pub kind: EntityKind,
    pub bgg_id: i64,
    pub name: String,
}

impl NamedEntity {
    pub fn new(kind: EntityKind, bgg_id: i64, name: impl Into<String>) -> Self {
        Self {
            kind,
            bgg_id,
            name: name.into(),
        }
    }
}
