//! Key-value storage trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{NoteError, NoteResult};

/// Durable string key-value storage.
pub trait KeyValueStore: Send + Sync {
  /// Read the value stored under `key`.
  fn read(&self, key: &str) -> NoteResult<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn write(&self, key: &str, value: &str) -> NoteResult<()>;

  /// Atomically read-modify-write the value under `key`.
  ///
  /// `apply` sees the current value and returns the replacement, or `None`
  /// to leave it untouched. No other write to the store interleaves.
  fn update(
    &self,
    key: &str,
    apply: &mut dyn FnMut(Option<&str>) -> NoteResult<Option<String>>,
  ) -> NoteResult<()>;
}

/// SQLite-backed key-value storage.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> NoteResult<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        NoteError::Storage(format!("Failed to create storage directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      NoteError::Storage(format!(
        "Failed to open note store at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::with_connection(conn)
  }

  /// Open a store that lives only as long as this value.
  pub fn open_in_memory() -> NoteResult<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> NoteResult<Self> {
    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| NoteError::Storage(format!("Failed to run store migrations: {}", e)))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> NoteResult<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| NoteError::Storage(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for the key-value table.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl KeyValueStore for SqliteStore {
  fn read(&self, key: &str) -> NoteResult<Option<String>> {
    let conn = self.lock()?;

    let value = conn
      .query_row(
        "SELECT value FROM local_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;

    Ok(value)
  }

  fn write(&self, key: &str, value: &str) -> NoteResult<()> {
    let conn = self.lock()?;

    conn.execute(
      "INSERT OR REPLACE INTO local_store (key, value, updated_at)
       VALUES (?, ?, datetime('now'))",
      params![key, value],
    )?;

    Ok(())
  }

  fn update(
    &self,
    key: &str,
    apply: &mut dyn FnMut(Option<&str>) -> NoteResult<Option<String>>,
  ) -> NoteResult<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current: Option<String> = tx
      .query_row(
        "SELECT value FROM local_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;

    if let Some(value) = apply(current.as_deref())? {
      tx.execute(
        "INSERT OR REPLACE INTO local_store (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )?;
    }

    tx.commit()?;
    Ok(())
  }
}
