//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations are run before any other operation, so schema bootstrap
//! is a one-time open concern rather than a per-request one.
//!
//! The index holds only routing metadata (no message content), so it is a
//! plain SQLite file.  WAL mode keeps concurrent appends from different
//! conversation pairs from blocking each other.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{IndexError, Result};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default index database.
    ///
    /// The database file is placed in the platform-appropriate data
    /// directory:
    /// - Linux:   `~/.local/share/sotto/chats.sqlite3`
    /// - macOS:   `~/Library/Application Support/com.sotto.sotto/chats.sqlite3`
    /// - Windows: `{FOLDERID_RoamingAppData}\sotto\sotto\data\chats.sqlite3`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "sotto", "sotto").ok_or(IndexError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("chats.sqlite3");

        tracing::info!(path = %db_path.display(), "opening index database");

        Self::open_at(&db_path)
    }

    /// Open (or create) an index database at an explicit path.
    ///
    /// This is what the server uses, and what tests use with a tempdir.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed pointer helpers, but direct access
    /// is occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
