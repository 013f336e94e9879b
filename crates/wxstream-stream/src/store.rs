//! Per-subscriber cached state and its persistence.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use wxstream_provider::WeatherReading;

/// State the stream engine owns for one subscriber. Only fully normalized
/// readings are ever written here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedState {
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_reading: Option<WeatherReading>,
    pub retry_count: u32,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt state for {subscriber_id}: {message}")]
    Corrupt {
        subscriber_id: String,
        message: String,
    },
}

/// Persistence seam for subscriber state.
pub trait StateStore: Send + Sync {
    fn get(&self, subscriber_id: &str) -> Result<Option<CachedState>, StoreError>;
    fn put(&self, subscriber_id: &str, state: &CachedState) -> Result<(), StoreError>;
}

impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    fn get(&self, subscriber_id: &str) -> Result<Option<CachedState>, StoreError> {
        (**self).get(subscriber_id)
    }

    fn put(&self, subscriber_id: &str, state: &CachedState) -> Result<(), StoreError> {
        (**self).put(subscriber_id, state)
    }
}

/// In-memory store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    states: RwLock<HashMap<String, CachedState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, subscriber_id: &str) -> Result<Option<CachedState>, StoreError> {
        Ok(self.states.read().get(subscriber_id).cloned())
    }

    fn put(&self, subscriber_id: &str, state: &CachedState) -> Result<(), StoreError> {
        self.states
            .write()
            .insert(subscriber_id.to_string(), state.clone());
        Ok(())
    }
}

/// SQLite-backed store. The reading is stored as a JSON blob, timestamps as
/// epoch milliseconds.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS subscriber_state (
                subscriber_id TEXT PRIMARY KEY,
                last_fetch_at_ms INTEGER,
                reading_json TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn get(&self, subscriber_id: &str) -> Result<Option<CachedState>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT last_fetch_at_ms, reading_json, retry_count FROM subscriber_state WHERE subscriber_id = ?1",
        )?;

        let mut rows = stmt.query(params![subscriber_id])?;
        let row = match rows.next()? {
            Some(row) => row,
            None => return Ok(None),
        };

        let last_ms: Option<i64> = row.get(0)?;
        let reading_json: Option<String> = row.get(1)?;
        let retry_count: u32 = row.get(2)?;

        let last_reading = match reading_json {
            Some(json) => {
                Some(
                    serde_json::from_str(&json).map_err(|e| StoreError::Corrupt {
                        subscriber_id: subscriber_id.to_string(),
                        message: e.to_string(),
                    })?,
                )
            }
            None => None,
        };

        Ok(Some(CachedState {
            last_fetch_at: last_ms.and_then(DateTime::from_timestamp_millis),
            last_reading,
            retry_count,
        }))
    }

    fn put(&self, subscriber_id: &str, state: &CachedState) -> Result<(), StoreError> {
        let reading_json = match &state.last_reading {
            Some(reading) => Some(serde_json::to_string(reading).map_err(|e| {
                StoreError::Corrupt {
                    subscriber_id: subscriber_id.to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };
        let now = Utc::now().timestamp_millis();

        self.conn.lock().execute(
            r#"
            INSERT OR REPLACE INTO subscriber_state
            (subscriber_id, last_fetch_at_ms, reading_json, retry_count, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                subscriber_id,
                state.last_fetch_at.map(|t| t.timestamp_millis()),
                reading_json,
                state.retry_count,
                now,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxstream_provider::ConditionCode;

    fn sample_state() -> CachedState {
        CachedState {
            last_fetch_at: DateTime::from_timestamp_millis(1_700_000_000_000),
            last_reading: Some(WeatherReading {
                temperature: 16,
                condition: ConditionCode::OpenWeatherMap("01d".to_string()),
            }),
            retry_count: 0,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let state = sample_state();

        store.put("sub-1", &state).unwrap();
        let loaded = store.get("sub-1").unwrap().unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_memory_store_missing_subscriber() {
        let store = MemoryStore::new();
        assert!(store.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let state = sample_state();

        store.put("sub-1", &state).unwrap();
        let loaded = store.get("sub-1").unwrap().unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_sqlite_store_missing_subscriber() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_store_overwrites_state() {
        let store = SqliteStore::in_memory().unwrap();
        let mut state = sample_state();

        store.put("sub-1", &state).unwrap();

        state.retry_count = 7;
        state.last_reading = None;
        store.put("sub-1", &state).unwrap();

        let loaded = store.get("sub-1").unwrap().unwrap();
        assert_eq!(loaded.retry_count, 7);
        assert!(loaded.last_reading.is_none());
    }

    #[test]
    fn test_sqlite_store_retry_count_without_reading() {
        let store = SqliteStore::in_memory().unwrap();
        let state = CachedState {
            retry_count: 10,
            ..CachedState::default()
        };

        store.put("sub-1", &state).unwrap();
        let loaded = store.get("sub-1").unwrap().unwrap();

        assert_eq!(loaded.retry_count, 10);
        assert!(loaded.last_fetch_at.is_none());
        assert!(loaded.last_reading.is_none());
    }

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.put("sub-1", &sample_state()).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        let loaded = store.get("sub-1").unwrap().unwrap();
        assert_eq!(loaded, sample_state());
    }

    #[test]
    fn test_yahoo_reading_round_trips() {
        let store = SqliteStore::in_memory().unwrap();
        let state = CachedState {
            last_fetch_at: DateTime::from_timestamp_millis(1_700_000_123_456),
            last_reading: Some(WeatherReading {
                temperature: -4,
                condition: ConditionCode::Yahoo(13),
            }),
            retry_count: 2,
        };

        store.put("sub-2", &state).unwrap();
        assert_eq!(store.get("sub-2").unwrap().unwrap(), state);
    }
}
