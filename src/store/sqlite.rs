//! Durable store backend built on SQLite. One database file per store name,
//! one table per collection.

use crate::store::adapter::{AssetStore, StoreBackend, StoreError, StoreFuture, StoreOpenFuture};
use crate::store::entry::CacheEntry;
use anyhow::anyhow;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

/// Opens SQLite-backed stores under a fixed data directory.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    data_dir: PathBuf,
}

impl SqliteBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl StoreBackend for SqliteBackend {
    fn open<'a>(&'a self, store_name: &'a str, collection_name: &'a str) -> StoreOpenFuture<'a> {
        let data_dir = self.data_dir.clone();
        let store_name = store_name.to_owned();
        let collection_name = collection_name.to_owned();
        Box::pin(run_blocking(move || {
            ensure_name(&store_name, "store name")?;
            ensure_name(&collection_name, "collection name")?;

            std::fs::create_dir_all(&data_dir).map_err(|err| {
                StoreError::Backend(anyhow!(
                    "failed to create store directory {}: {err}",
                    data_dir.display()
                ))
            })?;

            let path = data_dir.join(format!("{store_name}.db"));
            let conn = Connection::open(&path)?;
            // These pragmas return a result row, which `execute` rejects; the
            // setting itself still takes effect.
            let _ = conn.execute("PRAGMA journal_mode = WAL", []);
            let _ = conn.execute("PRAGMA busy_timeout = 5000", []);
            conn.execute(
                &format!(
                    r#"CREATE TABLE IF NOT EXISTS "{collection_name}" (
                        key TEXT PRIMARY KEY,
                        integrity TEXT NOT NULL,
                        expires_at TEXT,
                        payload BLOB NOT NULL
                    )"#
                ),
                [],
            )?;

            let store: Arc<dyn AssetStore> = Arc::new(SqliteStore {
                conn: Arc::new(Mutex::new(conn)),
                table: collection_name,
            });
            Ok(store)
        }))
    }
}

struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl AssetStore for SqliteStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CacheEntry>> {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        let key = key.to_owned();
        Box::pin(run_blocking(move || {
            let conn = lock_conn(&conn)?;
            let row = conn
                .query_row(
                    &format!(
                        r#"SELECT integrity, expires_at, payload FROM "{table}" WHERE key = ?1"#
                    ),
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Vec<u8>>(2)?,
                        ))
                    },
                )
                .optional()?;

            let Some((integrity, stored_expiry, payload)) = row else {
                return Ok(None);
            };
            let expires_at = stored_expiry
                .map(|text| parse_expiry(&key, &text))
                .transpose()?;
            Ok(Some(CacheEntry::new(
                key,
                integrity,
                expires_at,
                Bytes::from(payload),
            )))
        }))
    }

    fn put(&self, entry: CacheEntry) -> StoreFuture<'_, ()> {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        Box::pin(run_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                &format!(
                    r#"INSERT OR REPLACE INTO "{table}" (key, integrity, expires_at, payload)
                       VALUES (?1, ?2, ?3, ?4)"#
                ),
                params![
                    entry.key(),
                    entry.integrity(),
                    entry.expires_at().map(|at| at.to_rfc3339()),
                    entry.payload().as_ref(),
                ],
            )?;
            Ok(())
        }))
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        let key = key.to_owned();
        Box::pin(run_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                &format!(r#"DELETE FROM "{table}" WHERE key = ?1"#),
                params![key],
            )?;
            Ok(())
        }))
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        Box::pin(run_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(&format!(r#"DELETE FROM "{table}""#), [])?;
            Ok(())
        }))
    }

    fn list_keys(&self) -> StoreFuture<'_, Vec<String>> {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        Box::pin(run_blocking(move || {
            let conn = lock_conn(&conn)?;
            let mut stmt = conn.prepare(&format!(r#"SELECT key FROM "{table}""#))?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        }))
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result,
        Err(err) => Err(StoreError::Backend(anyhow!("store task failed: {err}"))),
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Backend(anyhow!("sqlite connection lock poisoned")))
}

fn parse_expiry(key: &str, text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| {
            StoreError::Backend(anyhow!("invalid expiry instant stored for {key}: {err}"))
        })
}

fn ensure_name(value: &str, what: &str) -> Result<(), StoreError> {
    // Names are embedded in file names and quoted SQL identifiers.
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if !valid {
        return Err(StoreError::Backend(anyhow!(
            "{what} {value:?} may only contain ASCII letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}
