use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use super::{BlobStoreError, BlobStoreResult};
use crate::traits::BlobStore;

const POISONED_MUTEX_MSG: &str = "Memory blob store mutex poisoned";

/// In-process [BlobStore], mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    items: Mutex<BTreeMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail until reset, simulating a
    /// backend that cannot be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect(POISONED_MUTEX_MSG).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> BlobStoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BlobStoreError::Unavailable(
                "memory store marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get_item(&self, key: &str) -> BlobStoreResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.items.lock().expect(POISONED_MUTEX_MSG).get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> BlobStoreResult<()> {
        self.ensure_available()?;
        self.items
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> BlobStoreResult<()> {
        self.ensure_available()?;
        self.items.lock().expect(POISONED_MUTEX_MSG).remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> BlobStoreResult<Vec<String>> {
        self.ensure_available()?;
        Ok(self
            .items
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .keys()
            .cloned()
            .collect())
    }

    async fn multi_remove(&self, keys: &[String]) -> BlobStoreResult<()> {
        self.ensure_available()?;
        let mut items = self.items.lock().expect(POISONED_MUTEX_MSG);
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryBlobStore::new();
        store.set_item("a", "1".to_string()).await.unwrap();
        store.set_item("a", "2".to_string()).await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap().as_deref(), Some("2"));

        store.remove_item("a").await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = MemoryBlobStore::new();
        store.set_item("a", "1".to_string()).await.unwrap();
        store.set_unavailable(true);

        assert!(store.get_item("a").await.is_err());
        assert!(store.set_item("b", "2".to_string()).await.is_err());
        assert!(store.get_all_keys().await.is_err());

        store.set_unavailable(false);
        assert_eq!(store.get_all_keys().await.unwrap(), vec!["a".to_string()]);
    }
}
