use async_trait::async_trait;

use crate::{blob_store::BlobStoreResult, UnixMillis};

/// Durable key/value storage of opaque serialized strings.
///
/// Values are owned by the caller; the store never interprets them.
/// Implementations must be safe to share across tasks, but callers that do
/// read-modify-write sequences are responsible for serializing them.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    async fn get_item(&self, key: &str) -> BlobStoreResult<Option<String>>;
    async fn set_item(&self, key: &str, value: String) -> BlobStoreResult<()>;
    async fn remove_item(&self, key: &str) -> BlobStoreResult<()>;
    async fn get_all_keys(&self) -> BlobStoreResult<Vec<String>>;
    /// Removes all given keys in one batch. Missing keys are ignored.
    async fn multi_remove(&self, keys: &[String]) -> BlobStoreResult<()>;
}

/// Source of wall-clock time used for expiry and record timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now_millis(&self) -> UnixMillis;

    fn now_secs(&self) -> i64 {
        (self.now_millis() / 1_000) as i64
    }
}
