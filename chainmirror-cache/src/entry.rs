use chainmirror_core::UnixMillis;
use serde::{Deserialize, Serialize};

/// What the cache persists for a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    pub stored_at: UnixMillis,
    pub expires_at: UnixMillis,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now: UnixMillis) -> bool {
        now > self.expires_at
    }
}

/// Result of a cache-first fetch.
///
/// `Failed` carries the fetcher's error, which is never stored. A fetcher
/// that legitimately produced an empty value yields `Miss` with that value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome<T, E> {
    Hit(T),
    Miss(T),
    Failed(E),
}

impl<T, E> CacheOutcome<T, E> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheOutcome::Hit(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            CacheOutcome::Hit(value) | CacheOutcome::Miss(value) => Some(value),
            CacheOutcome::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            CacheOutcome::Hit(value) | CacheOutcome::Miss(value) => Ok(value),
            CacheOutcome::Failed(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_strictly_after_expires_at() {
        let entry = CacheEntry {
            data: 1u8,
            stored_at: 100,
            expires_at: 200,
        };
        assert!(!entry.is_expired(200));
        assert!(entry.is_expired(201));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = CacheEntry {
            data: "x",
            stored_at: 1,
            expires_at: 2,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"data":"x","storedAt":1,"expiresAt":2}"#
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let hit: CacheOutcome<u8, String> = CacheOutcome::Hit(1);
        let failed: CacheOutcome<u8, String> =
            CacheOutcome::Failed("down".to_string());
        assert!(hit.is_hit());
        assert_eq!(hit.value(), Some(&1));
        assert_eq!(failed.value(), None);
        assert_eq!(failed.into_result(), Err("down".to_string()));
    }
}
