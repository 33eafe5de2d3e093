//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. It is the store handle
//! every component operates on; callers open as many handles on one file as
//! they need and SQLite's locking arbitrates between them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::{StoreConfig, DEFAULT_BUSY_TIMEOUT};
use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db_path = config.resolve_path()?;

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_with_timeout(&db_path, config.busy_timeout)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Reads go straight through this connection and see whatever the last
    /// committed write left behind.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Run `op` inside an immediate write transaction.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so writers on other
    /// handles queue behind it (up to the busy timeout). The transaction
    /// commits when `op` succeeds and rolls back when it fails; a failed
    /// rollback is reported as [`StoreError::Rollback`].
    pub(crate) fn write<T, F>(&mut self, label: &'static str, op: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        match op(&tx) {
            Ok(value) => {
                tx.commit().map_err(|e| {
                    tracing::error!(op = label, error = %e, "commit failed");
                    StoreError::Commit(e)
                })?;
                tracing::debug!(op = label, "committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::error!(op = label, error = %rollback, cause = %err, "rollback failed");
                    return Err(StoreError::Rollback(rollback));
                }
                tracing::debug!(op = label, error = %err, "rolled back");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());

        drop(db);
        Database::open_at(&path).expect("reopen runs no migrations twice");
    }

    #[test]
    fn open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            db_path: Some(dir.path().join("configured.db")),
            busy_timeout: Duration::from_millis(100),
        };
        let db = Database::open(&config).unwrap();
        assert!(db.path().unwrap().ends_with("configured.db"));
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("tx.db")).unwrap();

        let result: Result<()> = db.write("test", |tx| {
            tx.execute(
                "INSERT INTO users (nickname, fullname, email, about) VALUES ('a', 'A', 'a@x', '')",
                [],
            )?;
            Err(StoreError::UserNotFound("forced".into()))
        });
        assert!(matches!(result, Err(StoreError::UserNotFound(_))));

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
