//! Table layout of the game store
//!
//! Every statement is `IF NOT EXISTS`, so opening an existing database is a
//! no-op.

use crate::model::Relation;
use rusqlite::Connection;

const ENTITY_TABLES: &str = "
CREATE TABLE IF NOT EXISTS games (
    bgg_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    alt_name TEXT NOT NULL DEFAULT '[]',
    year INTEGER,
    description TEXT,
    url TEXT,
    image_url TEXT NOT NULL DEFAULT '[]',
    image_blurhash TEXT NOT NULL DEFAULT '[]',
    video_url TEXT NOT NULL DEFAULT '[]',
    external_link TEXT NOT NULL DEFAULT '[]',
    min_players INTEGER,
    max_players INTEGER,
    min_players_rec INTEGER,
    max_players_rec INTEGER,
    min_players_best INTEGER,
    max_players_best INTEGER,
    min_age INTEGER,
    max_age INTEGER,
    min_age_rec REAL,
    max_age_rec REAL,
    min_time INTEGER,
    max_time INTEGER,
    cooperative INTEGER NOT NULL DEFAULT 0,
    compilation INTEGER NOT NULL DEFAULT 0,
    available_on_bga INTEGER NOT NULL DEFAULT 0,
    bgg_rank INTEGER,
    num_votes INTEGER NOT NULL DEFAULT 0,
    avg_rating REAL,
    stddev_rating REAL,
    bayes_rating REAL,
    rec_rank INTEGER,
    rec_rating REAL,
    rec_stars REAL,
    complexity REAL,
    language_dependency REAL,
    created_at TEXT,
    modified_at TEXT,
    scraped_at TEXT,
    linked_ids TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS persons (
    bgg_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    bgg_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mechanics (
    bgg_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS game_types (
    bgg_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    name TEXT PRIMARY KEY,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id INTEGER NOT NULL REFERENCES games(bgg_id) ON DELETE CASCADE,
    user_id TEXT REFERENCES users(name) ON DELETE CASCADE,
    rating REAL,
    owned INTEGER NOT NULL DEFAULT 0,
    wishlist INTEGER,
    play_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_collections_user ON collections(user_id);

CREATE TABLE IF NOT EXISTS rankings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id INTEGER NOT NULL REFERENCES games(bgg_id) ON DELETE CASCADE,
    ranking_type TEXT NOT NULL,
    rank INTEGER NOT NULL,
    date TEXT NOT NULL,
    UNIQUE (game_id, ranking_type, date)
);

CREATE INDEX IF NOT EXISTS idx_rankings_type_date ON rankings(ranking_type, date, rank);
";

fn relation_table_sql(relation: Relation) -> String {
    let target = relation.target();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            from_id INTEGER NOT NULL REFERENCES games(bgg_id) ON DELETE CASCADE,
            to_id INTEGER NOT NULL REFERENCES {target}({key}) ON DELETE CASCADE,
            PRIMARY KEY (from_id, to_id)
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_to ON {table}(to_id);",
        table = relation.table(),
        target = target.table(),
        key = target.key_column(),
    )
}

pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(ENTITY_TABLES)?;
    for relation in Relation::all() {
        conn.execute_batch(&relation_table_sql(relation))?;
    }
    Ok(())
}
