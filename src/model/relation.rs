use super::EntityKind;

/// Many-to-many relations of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Designer,
    Artist,
    Category,
    Mechanic,
    GameType,
    CompilationOf,
    Implements,
    IntegratesWith,
    Cluster,
}

impl Relation {
    pub fn all() -> [Relation; 9] {
        [
            Relation::Designer,
            Relation::Artist,
            Relation::Category,
            Relation::Mechanic,
            Relation::GameType,
            Relation::CompilationOf,
            Relation::Implements,
            Relation::IntegratesWith,
            Relation::Cluster,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Designer => "designer",
            Relation::Artist => "artist",
            Relation::Category => "category",
            Relation::Mechanic => "mechanic",
            Relation::GameType => "game_type",
            Relation::CompilationOf => "compilation_of",
            Relation::Implements => "implements",
            Relation::IntegratesWith => "integrates_with",
            Relation::Cluster => "cluster",
        }
    }

    /// Join table with `(from_id, to_id)` columns
    pub fn table(&self) -> &'static str {
        match self {
            Relation::Designer => "game_designer",
            Relation::Artist => "game_artist",
            Relation::Category => "game_category",
            Relation::Mechanic => "game_mechanic",
            Relation::GameType => "game_game_type",
            Relation::CompilationOf => "game_compilation_of",
            Relation::Implements => "game_implements",
            Relation::IntegratesWith => "game_integrates_with",
            Relation::Cluster => "game_cluster",
        }
    }

    pub fn target(&self) -> EntityKind {
        match self {
            Relation::Designer | Relation::Artist => EntityKind::Person,
            Relation::Category => EntityKind::Category,
            Relation::Mechanic => EntityKind::Mechanic,
            Relation::GameType => EntityKind::GameType,
            _ => EntityKind::Game,
        }
    }

    /// Symmetric relations store each edge once as `(min, max)`
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Relation::IntegratesWith | Relation::Cluster)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
