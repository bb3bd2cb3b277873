use std::{path::Path, sync::Mutex};

use async_trait::async_trait;
use log::*;
use rusqlite::{params, Connection, OptionalExtension};

use super::BlobStoreResult;
use crate::traits::BlobStore;

const POISONED_MUTEX_MSG: &str = "Sqlite blob store connection poisoned";

// -----------------
// SqliteBlobStore
// -----------------
/// [BlobStore] persisted in a single `kv` table of a SQLite database.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    pub fn new<P>(db_file: P) -> BlobStoreResult<Self>
    where
        P: AsRef<Path>,
    {
        let conn = Connection::open(db_file)?;
        Self::create_kv_table(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a database that lives only as long as this store.
    pub fn open_in_memory() -> BlobStoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_kv_table(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn create_kv_table(conn: &Connection) -> BlobStoreResult<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn get_item(&self, key: &str) -> BlobStoreResult<Option<String>> {
        let conn = self.conn.lock().expect(POISONED_MUTEX_MSG);
        let value: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: String) -> BlobStoreResult<()> {
        let conn = self.conn.lock().expect(POISONED_MUTEX_MSG);
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> BlobStoreResult<()> {
        let conn = self.conn.lock().expect(POISONED_MUTEX_MSG);
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    async fn get_all_keys(&self) -> BlobStoreResult<Vec<String>> {
        let conn = self.conn.lock().expect(POISONED_MUTEX_MSG);
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, rusqlite::Error>>()?)
    }

    async fn multi_remove(&self, keys: &[String]) -> BlobStoreResult<()> {
        let mut conn = self.conn.lock().expect(POISONED_MUTEX_MSG);
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM kv WHERE key = ?1")?;
            for key in keys {
                stmt.execute([key])?;
            }
        }
        tx.commit()?;
        debug!("Removed {} keys from blob store", keys.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::*;

    fn setup_test_store() -> (SqliteBlobStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteBlobStore::new(temp_file.path()).unwrap();
        (store, temp_file)
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_value() {
        let (store, _file) = setup_test_store();
        store.set_item("k", "first".to_string()).await.unwrap();
        store.set_item("k", "second".to_string()).await.unwrap();

        assert_eq!(
            store.get_item("k").await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(store.get_item("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multi_remove_and_keys() {
        let (store, _file) = setup_test_store();
        for key in ["cache_a", "cache_b", "other"] {
            store.set_item(key, "v".to_string()).await.unwrap();
        }

        store
            .multi_remove(&["cache_a".to_string(), "cache_b".to_string()])
            .await
            .unwrap();

        assert_eq!(
            store.get_all_keys().await.unwrap(),
            vec!["other".to_string()]
        );
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let store = SqliteBlobStore::new(temp_file.path()).unwrap();
            store.set_item("persisted", "yes".to_string()).await.unwrap();
        }
        let store = SqliteBlobStore::new(temp_file.path()).unwrap();
        assert_eq!(
            store.get_item("persisted").await.unwrap().as_deref(),
            Some("yes")
        );
    }
}
