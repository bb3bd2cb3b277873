mod error;
mod memory;
mod sqlite;

pub use error::{BlobStoreError, BlobStoreResult};
pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;
