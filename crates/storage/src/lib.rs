#![forbid(unsafe_code)]

pub mod clock;

use kt_core::model::CriterionStatus;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;
use std::path::Path;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

/// One unit of work. Timestamps are ISO-8601 with second precision, UTC,
/// no offset. Names are free text, not unique; lookups resolve to the
/// lowest id.
#[derive(Clone, Debug, Serialize)]
pub struct KeyRow {
    pub id: i64,
    pub key_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CriterionRow {
    pub id: i64,
    pub key_id: i64,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct UndoLogRow {
    pub id: i64,
    pub key_id: i64,
    pub action: String,
    pub commit_hash: Option<String>,
    pub timestamp: String,
}

/// SQLite-backed store for keys, acceptance criteria and the undo log.
///
/// Writes go through [`KeyStore::scope`]: one logical operation (one command
/// invocation, one import) runs inside one transaction and commits on
/// success; on any failure the transaction rolls back and the connection is
/// still released. Single-writer use is assumed; concurrent handles on the
/// same file are not coordinated.
#[derive(Debug)]
pub struct KeyStore {
    conn: Connection,
}

impl KeyStore {
    /// Open the store, creating the file and the schema if absent.
    /// Never destructive; reopening an existing store is a no-op on the
    /// schema.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS keys (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              key_name TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS acceptance_criteria (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              key_id INTEGER NOT NULL,
              description TEXT NOT NULL,
              status TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL,
              FOREIGN KEY (key_id) REFERENCES keys(id)
            );

            CREATE TABLE IF NOT EXISTS undo_logs (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              key_id INTEGER NOT NULL,
              action TEXT NOT NULL,
              commit_hash TEXT,
              timestamp TEXT NOT NULL,
              FOREIGN KEY (key_id) REFERENCES keys(id)
            );
            "#,
        )?;
        Ok(())
    }

    /// Irreversibly drop all three tables. Importer-only: the store is
    /// rebuilt from scratch right after.
    pub fn reset(db_path: impl AsRef<Path>) -> Result<(), StoreError> {
        let conn = Connection::open(db_path.as_ref())?;
        conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS undo_logs;
            DROP TABLE IF EXISTS acceptance_criteria;
            DROP TABLE IF EXISTS keys;
            "#,
        )?;
        Ok(())
    }

    /// Run `f` inside one transaction: every write either commits together
    /// when `f` returns `Ok`, or rolls back together when it returns `Err`.
    /// The scope of a transaction is exactly one logical operation.
    pub fn scope<T>(
        &mut self,
        f: impl FnOnce(&StoreScope<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let tx = self.conn.transaction()?;
        let scope = StoreScope { tx };
        let out = f(&scope)?;
        scope.tx.commit()?;
        Ok(out)
    }

    pub fn insert_key(&mut self, name: &str, now: &str) -> Result<i64, StoreError> {
        self.scope(|txn| txn.insert_key(name, now))
    }

    pub fn insert_criterion(
        &mut self,
        key_id: i64,
        description: &str,
        status: CriterionStatus,
        now: &str,
    ) -> Result<i64, StoreError> {
        self.scope(|txn| txn.insert_criterion(key_id, description, status, now))
    }

    pub fn insert_undo_log(
        &mut self,
        key_id: i64,
        action: &str,
        commit_hash: &str,
        now: &str,
    ) -> Result<i64, StoreError> {
        self.scope(|txn| txn.insert_undo_log(key_id, action, commit_hash, now))
    }

    pub fn update_key_timestamp(&mut self, id: i64, now: &str) -> Result<(), StoreError> {
        self.scope(|txn| txn.update_key_timestamp(id, now))
    }

    pub fn set_criteria_status_for_key(
        &mut self,
        key_id: i64,
        status: CriterionStatus,
        now: &str,
    ) -> Result<usize, StoreError> {
        self.scope(|txn| txn.set_criteria_status_for_key(key_id, status, now))
    }

    /// Resolve a key name to its id. Duplicate names are permitted; the
    /// first match by ascending id wins.
    pub fn find_key_by_name(&self, name: &str) -> Result<Option<i64>, StoreError> {
        find_key_by_name(&self.conn, name)
    }

    pub fn list_keys(&self) -> Result<Vec<KeyRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, key_name, created_at, updated_at FROM keys ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(KeyRow {
                id: row.get(0)?,
                key_name: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_criteria(&self) -> Result<Vec<CriterionRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, key_id, description, status, created_at, updated_at
            FROM acceptance_criteria
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CriterionRow {
                id: row.get(0)?,
                key_id: row.get(1)?,
                description: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_undo_logs(&self) -> Result<Vec<UndoLogRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, key_id, action, commit_hash, timestamp FROM undo_logs ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UndoLogRow {
                id: row.get(0)?,
                key_id: row.get(1)?,
                action: row.get(2)?,
                commit_hash: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn criteria_for_key(&self, key_id: i64) -> Result<Vec<CriterionRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, key_id, description, status, created_at, updated_at
            FROM acceptance_criteria
            WHERE key_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![key_id], |row| {
            Ok(CriterionRow {
                id: row.get(0)?,
                key_id: row.get(1)?,
                description: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Write surface of one open transaction. Handed to the closure passed to
/// [`KeyStore::scope`]; dropped without commit when the closure fails.
#[derive(Debug)]
pub struct StoreScope<'conn> {
    tx: Transaction<'conn>,
}

impl StoreScope<'_> {
    pub fn insert_key(&self, name: &str, now: &str) -> Result<i64, StoreError> {
        self.tx.execute(
            "INSERT INTO keys(key_name, created_at, updated_at) VALUES (?1, ?2, ?3)",
            params![name, now, now],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn insert_criterion(
        &self,
        key_id: i64,
        description: &str,
        status: CriterionStatus,
        now: &str,
    ) -> Result<i64, StoreError> {
        self.tx.execute(
            r#"
            INSERT INTO acceptance_criteria(key_id, description, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![key_id, description, status.as_str(), now, now],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn insert_undo_log(
        &self,
        key_id: i64,
        action: &str,
        commit_hash: &str,
        now: &str,
    ) -> Result<i64, StoreError> {
        self.tx.execute(
            r#"
            INSERT INTO undo_logs(key_id, action, commit_hash, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![key_id, action, commit_hash, now],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn update_key_timestamp(&self, id: i64, now: &str) -> Result<(), StoreError> {
        self.tx.execute(
            "UPDATE keys SET updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;
        Ok(())
    }

    /// Set every criterion of the key to `status`, regardless of current
    /// status; keylock applies this to already-Final criteria too.
    pub fn set_criteria_status_for_key(
        &self,
        key_id: i64,
        status: CriterionStatus,
        now: &str,
    ) -> Result<usize, StoreError> {
        let updated = self.tx.execute(
            "UPDATE acceptance_criteria SET status = ?2, updated_at = ?3 WHERE key_id = ?1",
            params![key_id, status.as_str(), now],
        )?;
        Ok(updated)
    }

    pub fn find_key_by_name(&self, name: &str) -> Result<Option<i64>, StoreError> {
        find_key_by_name(&self.tx, name)
    }
}

fn find_key_by_name(conn: &Connection, name: &str) -> Result<Option<i64>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT id FROM keys WHERE key_name = ?1 ORDER BY id ASC LIMIT 1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?)
}
