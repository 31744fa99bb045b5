use rusqlite::Connection;

use crate::error::Result;

/// Initialise the cache table. Safe to call on every startup (idempotent).
///
/// One row per cache kind: the serialized payload and the instant it was
/// last refreshed.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cache_entries (
            kind          TEXT NOT NULL PRIMARY KEY,
            payload       TEXT NOT NULL,   -- JSON blob, opaque to SQL
            refreshed_at  TEXT NOT NULL    -- RFC3339 UTC
        );",
    )?;
    Ok(())
}
