//! v001 -- Initial schema creation.
//!
//! Creates the single `pointers` table.  The index is append-only: rows are
//! never updated or deleted by the application.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Message pointers
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pointers (
    created_at   TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    from_user_id TEXT NOT NULL,
    to_user_id   TEXT NOT NULL,
    container_id TEXT NOT NULL,               -- UUID of the vault container
    document_id  TEXT NOT NULL,               -- UUID assigned by the vault

    -- Natural key: one pointer per vault document.  Makes appends
    -- idempotent, so a client may retry a failed send safely.
    UNIQUE (container_id, document_id)
);

CREATE INDEX IF NOT EXISTS idx_pointers_pair_ts
    ON pointers(from_user_id, to_user_id, created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
