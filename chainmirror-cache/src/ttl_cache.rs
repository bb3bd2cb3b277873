use std::{future::Future, sync::Arc, time::Duration};

use chainmirror_config::CacheConfig;
use chainmirror_core::{BlobStore, Clock};
use chainmirror_metrics::metrics::{self, CacheLookup};
use log::*;
use serde::{de::DeserializeOwned, Serialize};

use crate::entry::{CacheEntry, CacheOutcome};

/// Expiring key/value cache over a [BlobStore].
///
/// Every operation degrades to "no data" when the store misbehaves;
/// nothing here returns an error to the caller. All keys are written under
/// `namespace` so the cache can share a store with other persisted data.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    namespace: String,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(
        store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store,
            clock,
            namespace: config.namespace.clone(),
            default_ttl: config.default_ttl(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Returns the cached value unless it is absent, expired or unreadable.
    /// Expired and unreadable entries are removed on the way out.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let slot = self.namespaced(key);
        let raw = match self.store.get_item(&slot).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics::inc_cache_lookup(&CacheLookup::Miss);
                return None;
            }
            Err(err) => {
                error!("Failed to read cache slot '{}': {:?}", slot, err);
                metrics::inc_cache_lookup(&CacheLookup::Miss);
                return None;
            }
        };

        let entry = match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Dropping undecodable cache slot '{}': {}", slot, err);
                self.remove_slot(&slot).await;
                metrics::inc_cache_lookup(&CacheLookup::Miss);
                return None;
            }
        };

        if entry.is_expired(self.clock.now_millis()) {
            debug!("Cache slot '{}' expired", slot);
            self.remove_slot(&slot).await;
            metrics::inc_cache_lookup(&CacheLookup::Expired);
            return None;
        }

        metrics::inc_cache_lookup(&CacheLookup::Hit);
        Some(entry.data)
    }

    pub async fn set<T: Serialize>(&self, key: &str, data: &T) {
        self.set_with_ttl(key, data, self.default_ttl).await
    }

    /// Overwrites the slot. A zero `ttl` is treated as one millisecond.
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        ttl: Duration,
    ) {
        let slot = self.namespaced(key);
        let stored_at = self.clock.now_millis();
        let ttl_millis =
            u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let entry = CacheEntry {
            data,
            stored_at,
            expires_at: stored_at.saturating_add(ttl_millis),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                error!("Failed to encode cache slot '{}': {}", slot, err);
                return;
            }
        };
        if let Err(err) = self.store.set_item(&slot, raw).await {
            error!("Failed to write cache slot '{}': {:?}", slot, err);
        }
    }

    pub async fn invalidate(&self, key: &str) {
        let slot = self.namespaced(key);
        self.remove_slot(&slot).await;
    }

    /// Removes every slot under this cache's namespace in one batch.
    pub async fn clear_all(&self) {
        let keys = match self.store.get_all_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                error!("Failed to list cache slots: {:?}", err);
                return;
            }
        };
        let ours = keys
            .into_iter()
            .filter(|key| key.starts_with(&self.namespace))
            .collect::<Vec<_>>();
        if ours.is_empty() {
            return;
        }
        info!("Clearing {} cache slots", ours.len());
        if let Err(err) = self.store.multi_remove(&ours).await {
            error!("Failed to clear cache slots: {:?}", err);
        }
    }

    /// Serves `key` from the cache, falling back to `fetcher` on a miss.
    ///
    /// A successful fetch is stored with `ttl` (or the default TTL) before
    /// it is returned. A failed fetch is logged and surfaced as
    /// [CacheOutcome::Failed], leaving the slot untouched.
    pub async fn fetch_with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> CacheOutcome<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: std::fmt::Debug,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            trace!("Serving '{}' from cache", key);
            return CacheOutcome::Hit(cached);
        }
        match fetcher().await {
            Ok(fresh) => {
                self.set_with_ttl(key, &fresh, ttl.unwrap_or(self.default_ttl))
                    .await;
                CacheOutcome::Miss(fresh)
            }
            Err(err) => {
                warn!("Fetch for '{}' failed: {:?}", key, err);
                CacheOutcome::Failed(err)
            }
        }
    }

    async fn remove_slot(&self, slot: &str) {
        if let Err(err) = self.store.remove_item(slot).await {
            error!("Failed to remove cache slot '{}': {:?}", slot, err);
        }
    }
}
