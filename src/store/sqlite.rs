use super::pragma::{apply_optimized_pragmas, enable_foreign_keys};
use super::rows::{date_text, Persist, RowWrite};
use super::schema::create_schema;
use crate::model::{EntityKind, RankingRecord, RankingType, Relation};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Per-row tally of one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub written: usize,
    /// Existing rows whose content changed
    pub updated: usize,
    /// Rows that already existed and were left untouched
    pub kept: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: BatchOutcome) {
        self.written += other.written;
        self.updated += other.updated;
        self.kept += other.kept;
        self.failed += other.failed;
    }
}

/// Insert rows one by one; a failing row is logged and counted while its
/// siblings still go in.
pub fn insert_rows<P: Persist>(conn: &Connection, rows: &[P]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for row in rows {
        match row.insert(conn) {
            Ok(RowWrite::Created) => outcome.written += 1,
            Ok(RowWrite::Updated) => outcome.updated += 1,
            Ok(RowWrite::Kept) => outcome.kept += 1,
            Err(e) => {
                log::warn!("⚠️  Failed to insert {}: {}", row.label(), e);
                outcome.failed += 1;
            }
        }
    }

    outcome
}

/// Replace the relation set of `from_id`.
///
/// For symmetric relations every edge touching `from_id` is dropped first,
/// then the new edges are stored from their canonical side.
pub fn set_relation(
    conn: &Connection,
    relation: Relation,
    from_id: i64,
    to_ids: &[i64],
) -> rusqlite::Result<usize> {
    let delete = if relation.is_symmetric() {
        format!("DELETE FROM {} WHERE from_id = ?1 OR to_id = ?1", relation.table())
    } else {
        format!("DELETE FROM {} WHERE from_id = ?1", relation.table())
    };
    conn.execute(&delete, params![from_id])?;

    let mut written = 0;
    for to_id in to_ids {
        written += add_edge(conn, relation, from_id, *to_id)?;
    }
    Ok(written)
}

/// Store one edge; repeated edges are ignored, dangling ids are rejected
pub fn add_edge(
    conn: &Connection,
    relation: Relation,
    from_id: i64,
    to_id: i64,
) -> rusqlite::Result<usize> {
    let (from_id, to_id) = if relation.is_symmetric() && to_id < from_id {
        (to_id, from_id)
    } else {
        (from_id, to_id)
    };

    let sql = format!(
        "INSERT OR IGNORE INTO {} (from_id, to_id) VALUES (?1, ?2)",
        relation.table()
    );
    conn.execute(&sql, params![from_id, to_id])
}

/// SQLite-backed entity store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        log::info!("✅ SQLite store opened: {}", db_path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        enable_foreign_keys(&conn)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction; an error rolls the whole thing back
    pub fn in_transaction<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut tx = self.conn.transaction()?;
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn write_batch<P: Persist>(&mut self, rows: &[P]) -> Result<BatchOutcome, StoreError> {
        self.in_transaction(|tx| Ok(insert_rows(tx, rows)))
    }

    /// Primary keys of an integer-keyed entity kind
    pub fn existing_ids(&self, kind: EntityKind) -> Result<HashSet<i64>, StoreError> {
        let sql = format!("SELECT {} FROM {}", kind.key_column(), kind.table());
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn count(&self, kind: EntityKind) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn edge_count(&self, relation: Relation) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", relation.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Stored name of a Person, Category, Mechanic or GameType
    pub fn name_of(&self, kind: EntityKind, bgg_id: i64) -> Result<Option<String>, StoreError> {
        let sql = format!("SELECT name FROM {} WHERE bgg_id = ?1", kind.table());
        let name = self
            .conn
            .query_row(&sql, params![bgg_id], |row| row.get(0))
            .optional()?;
        Ok(name)
    }

    /// Sorted targets of `from_id`; symmetric relations are read from both sides
    pub fn relation_targets(&self, relation: Relation, from_id: i64) -> Result<Vec<i64>, StoreError> {
        let sql = if relation.is_symmetric() {
            format!(
                "SELECT to_id FROM {table} WHERE from_id = ?1
                 UNION SELECT from_id FROM {table} WHERE to_id = ?1
                 ORDER BY 1",
                table = relation.table()
            )
        } else {
            format!(
                "SELECT to_id FROM {} WHERE from_id = ?1 ORDER BY to_id",
                relation.table()
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![from_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Ranking rows of one type and date, ordered by rank
    pub fn rankings(
        &self,
        ranking_type: RankingType,
        date: NaiveDate,
    ) -> Result<Vec<RankingRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT game_id, rank FROM rankings
             WHERE ranking_type = ?1 AND date = ?2
             ORDER BY rank, game_id",
        )?;
        let rows = stmt
            .query_map(params![ranking_type.code(), date_text(&date)], |row| {
                Ok(RankingRecord {
                    game_id: row.get(0)?,
                    ranking_type,
                    rank: row.get(1)?,
                    date,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete everything, dependents first
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.in_transaction(|tx| {
            for relation in Relation::all() {
                tx.execute(&format!("DELETE FROM {}", relation.table()), [])?;
            }
            for kind in [
                EntityKind::Ranking,
                EntityKind::Collection,
                EntityKind::User,
                EntityKind::Person,
                EntityKind::Category,
                EntityKind::Mechanic,
                EntityKind::GameType,
                EntityKind::Game,
            ] {
                tx.execute(&format!("DELETE FROM {}", kind.table()), [])?;
            }
            Ok(())
        })?;

        log::info!("🗑️  Store cleared");
        Ok(())
    }
}
