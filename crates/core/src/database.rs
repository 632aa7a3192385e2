use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::AppConfig;
use crate::model::Task;

pub const TASKS_KEY: &str = "agendaTasks";
pub const SETTINGS_KEY: &str = "agendaSettings";
pub const PROFILE_KEY: &str = "agendaProfile";
pub const PERMISSION_KEY: &str = "notificationPermission";

/// Persistence collaborator for the task collection.
///
/// `load` returns `Ok(None)` when nothing has been stored yet and an error
/// when the stored value cannot be read back at all. Individual records that
/// no longer parse are skipped.
pub trait TaskStorage {
    fn load(&self) -> Result<Option<Vec<Task>>>;
    fn save(&mut self, tasks: &[Task]) -> Result<()>;
}

/// String key-value store on SQLite. Values are JSON documents.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let conn = Connection::open(config.db_path()).with_context(|| {
            format!("Failed to open database at {}", config.db_path().display())
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to configure SQLite WAL mode")?;

        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = :key",
                named_params![":key": key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read '{}'", key))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (:key, :value, :updated_at)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                named_params![
                    ":key": key,
                    ":value": value,
                    ":updated_at": Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| format!("Failed to write '{}'", key))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = :key", named_params![":key": key])
            .with_context(|| format!("Failed to remove '{}'", key))?;
        Ok(affected > 0)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Stored value for '{}' is not valid", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
             );",
        )?;
        Ok(())
    }
}

impl TaskStorage for Database {
    fn load(&self) -> Result<Option<Vec<Task>>> {
        let Some(records) = self.get_json::<Vec<Value>>(TASKS_KEY)? else {
            return Ok(None);
        };
        let tasks = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!(index, error = %err, "skipping unreadable task record");
                    None
                }
            })
            .collect();
        Ok(Some(tasks))
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        self.put_json(TASKS_KEY, tasks)
    }
}
