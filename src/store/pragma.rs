//! Connection tuning for bulk loads

use rusqlite::Connection;

/// WAL journal, NORMAL sync, in-memory temp store, 64MB page cache and
/// autocheckpoint every 1000 pages.
///
/// `journal_mode` and `wal_autocheckpoint` answer with a row, so they go
/// through `pragma_update_and_check`.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "cache_size", -64_000)?;
    let checkpoint: i64 =
        conn.pragma_update_and_check(None, "wal_autocheckpoint", 1000, |row| row.get(0))?;

    log::debug!(
        "📊 SQLite pragmas applied (journal_mode={}, wal_autocheckpoint={})",
        mode,
        checkpoint
    );

    Ok(())
}

/// Relation updates rely on the database rejecting dangling ids
pub fn enable_foreign_keys(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
}
