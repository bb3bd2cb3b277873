pub mod cache_keys;
mod entry;
mod ttl_cache;

pub use entry::{CacheEntry, CacheOutcome};
pub use ttl_cache::TtlCache;
