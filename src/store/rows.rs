//! Row mapping from typed entities to their tables

use crate::model::{Collection, EntityKind, Game, NamedEntity, RankingRecord, User};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// What one row write did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowWrite {
    Created,
    Updated,
    /// The row already existed and was left as it was
    Kept,
}

/// An entity that knows how to insert itself
pub trait Persist {
    fn kind(&self) -> EntityKind;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<RowWrite>;

    /// Short description for log lines
    fn label(&self) -> String;
}

fn json_text<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn timestamp(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.as_ref().map(|dt| dt.to_rfc3339())
}

pub fn date_text(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_exists<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<bool> {
    Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
}

impl Persist for Game {
    fn kind(&self) -> EntityKind {
        EntityKind::Game
    }

    // a re-scraped game replaces the stored row
    fn insert(&self, conn: &Connection) -> rusqlite::Result<RowWrite> {
        let existed = row_exists(conn, "SELECT 1 FROM games WHERE bgg_id = ?1", params![self.bgg_id])?;
        conn.execute(
            "INSERT INTO games (
                bgg_id, name, alt_name, year, description,
                url, image_url, image_blurhash, video_url, external_link,
                min_players, max_players, min_players_rec, max_players_rec,
                min_players_best, max_players_best, min_age, max_age,
                min_age_rec, max_age_rec, min_time, max_time,
                cooperative, compilation, available_on_bga,
                bgg_rank, num_votes, avg_rating, stddev_rating, bayes_rating,
                rec_rank, rec_rating, rec_stars, complexity, language_dependency,
                created_at, modified_at, scraped_at, linked_ids
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38, ?39
            )
            ON CONFLICT(bgg_id) DO UPDATE SET
                name = excluded.name, alt_name = excluded.alt_name,
                year = excluded.year, description = excluded.description,
                url = excluded.url, image_url = excluded.image_url,
                image_blurhash = excluded.image_blurhash,
                video_url = excluded.video_url, external_link = excluded.external_link,
                min_players = excluded.min_players, max_players = excluded.max_players,
                min_players_rec = excluded.min_players_rec,
                max_players_rec = excluded.max_players_rec,
                min_players_best = excluded.min_players_best,
                max_players_best = excluded.max_players_best,
                min_age = excluded.min_age, max_age = excluded.max_age,
                min_age_rec = excluded.min_age_rec, max_age_rec = excluded.max_age_rec,
                min_time = excluded.min_time, max_time = excluded.max_time,
                cooperative = excluded.cooperative, compilation = excluded.compilation,
                available_on_bga = excluded.available_on_bga,
                bgg_rank = excluded.bgg_rank, num_votes = excluded.num_votes,
                avg_rating = excluded.avg_rating,
                stddev_rating = excluded.stddev_rating,
                bayes_rating = excluded.bayes_rating, rec_rank = excluded.rec_rank,
                rec_rating = excluded.rec_rating, rec_stars = excluded.rec_stars,
                complexity = excluded.complexity,
                language_dependency = excluded.language_dependency,
                created_at = excluded.created_at, modified_at = excluded.modified_at,
                scraped_at = excluded.scraped_at, linked_ids = excluded.linked_ids",
            params![
                self.bgg_id,
                self.name,
                json_text(&self.alt_name)?,
                self.year,
                self.description,
                self.url,
                json_text(&self.image_url)?,
                json_text(&self.image_blurhash)?,
                json_text(&self.video_url)?,
                json_text(&self.external_link)?,
                self.min_players,
                self.max_players,
                self.min_players_rec,
                self.max_players_rec,
                self.min_players_best,
                self.max_players_best,
                self.min_age,
                self.max_age,
                self.min_age_rec,
                self.max_age_rec,
                self.min_time,
                self.max_time,
                self.cooperative,
                self.compilation,
                self.available_on_bga,
                self.bgg_rank,
                self.num_votes,
                self.avg_rating,
                self.stddev_rating,
                self.bayes_rating,
                self.rec_rank,
                self.rec_rating,
                self.rec_stars,
                self.complexity,
                self.language_dependency,
                timestamp(&self.created_at),
                timestamp(&self.modified_at),
                timestamp(&self.scraped_at),
                json_text(&self.linked_ids)?,
            ],
        )?;
        Ok(if existed { RowWrite::Updated } else { RowWrite::Created })
    }

    fn label(&self) -> String {
        format!("Game <{}> {:?}", self.bgg_id, self.name)
    }
}

impl Persist for NamedEntity {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    // an existing row keeps its stored name
    fn insert(&self, conn: &Connection) -> rusqlite::Result<RowWrite> {
        let sql = format!(
            "INSERT INTO {} (bgg_id, name) VALUES (?1, ?2) ON CONFLICT(bgg_id) DO NOTHING",
            self.kind.table()
        );
        match conn.execute(&sql, params![self.bgg_id, self.name])? {
            0 => Ok(RowWrite::Kept),
            _ => Ok(RowWrite::Created),
        }
    }

    fn label(&self) -> String {
        format!("{} <{}> {:?}", self.kind, self.bgg_id, self.name)
    }
}

impl Persist for User {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<RowWrite> {
        let existed = row_exists(conn, "SELECT 1 FROM users WHERE name = ?1", params![self.name])?;
        conn.execute(
            "INSERT INTO users (name, updated_at) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET
                updated_at = COALESCE(excluded.updated_at, users.updated_at)",
            params![self.name, timestamp(&self.updated_at)],
        )?;
        Ok(if existed { RowWrite::Updated } else { RowWrite::Created })
    }

    fn label(&self) -> String {
        format!("User <{}>", self.name)
    }
}

impl Persist for Collection {
    fn kind(&self) -> EntityKind {
        EntityKind::Collection
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<RowWrite> {
        conn.execute(
            "INSERT INTO collections (game_id, user_id, rating, owned, wishlist, play_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.game_id,
                self.user_id,
                self.rating,
                self.owned,
                self.wishlist,
                self.play_count,
            ],
        )?;
        Ok(RowWrite::Created)
    }

    fn label(&self) -> String {
        format!(
            "Collection <{}/{}>",
            self.user_id.as_deref().unwrap_or("-"),
            self.game_id
        )
    }
}

impl Persist for RankingRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::Ranking
    }

    // an existing row only changes when its rank moved
    fn insert(&self, conn: &Connection) -> rusqlite::Result<RowWrite> {
        let date = date_text(&self.date);
        let inserted = conn.execute(
            "INSERT INTO rankings (game_id, ranking_type, rank, date) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(game_id, ranking_type, date) DO NOTHING",
            params![self.game_id, self.ranking_type.code(), self.rank, date],
        )?;
        if inserted > 0 {
            return Ok(RowWrite::Created);
        }

        let updated = conn.execute(
            "UPDATE rankings SET rank = ?3
             WHERE game_id = ?1 AND ranking_type = ?2 AND date = ?4 AND rank != ?3",
            params![self.game_id, self.ranking_type.code(), self.rank, date],
        )?;
        Ok(if updated > 0 { RowWrite::Updated } else { RowWrite::Kept })
    }

    fn label(&self) -> String {
        format!(
            "Ranking <{}/{}/{}>",
            self.ranking_type, self.game_id, self.date
        )
    }
}
