/// Milliseconds since the Unix epoch.
pub type UnixMillis = u64;

/// A macro that panics when running a debug build and logs the panic message
/// instead when running in release mode.
#[macro_export]
macro_rules! debug_panic {
    ($($arg:tt)*) => (
        if cfg!(debug_assertions) {
            panic!($($arg)*);
        } else {
            ::log::error!($($arg)*);
        }
    )
}

pub mod blob_store;
pub mod clock;
pub mod normalize;
pub mod round_timer;
pub mod traits;

pub use blob_store::{
    BlobStoreError, BlobStoreResult, MemoryBlobStore, SqliteBlobStore,
};
pub use clock::{ManualClock, SystemClock};
pub use traits::{BlobStore, Clock};
