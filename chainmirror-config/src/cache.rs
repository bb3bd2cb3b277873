use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Prefix of every cache key in the blob store. Keeps cache slots apart
    /// from other persisted data such as the transaction history.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_ttl_millis")]
    pub default_ttl_millis: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            default_ttl_millis: default_ttl_millis(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_millis)
    }
}

fn default_namespace() -> String {
    "cache_".to_string()
}

fn default_ttl_millis() -> u64 {
    5 * 60 * 1_000
}
