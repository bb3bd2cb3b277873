use thiserror::Error;

pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

#[derive(Error, Debug)]
pub enum BlobStoreError {
    #[error("RusqliteError: '{0}' ({0:?})")]
    RusqliteError(#[from] rusqlite::Error),

    #[error("Blob store is unavailable: {0}")]
    Unavailable(String),
}
