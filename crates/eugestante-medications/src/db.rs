use rusqlite::Connection;

use crate::error::Result;

/// Initialise the medications schema in `conn`.
///
/// Creates the `medications` table (idempotent) and an index on `user_id`
/// since every read is scoped to one account.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS medications (
            id          TEXT    NOT NULL PRIMARY KEY,
            user_id     TEXT    NOT NULL,
            name        TEXT    NOT NULL,
            times       TEXT    NOT NULL,   -- JSON array of \"HH:MM\"
            active      INTEGER NOT NULL DEFAULT 1,
            notes       TEXT,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_medications_user ON medications (user_id);
        ",
    )?;
    Ok(())
}
