use chainmirror_rpc_client::ReadCallError;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("ReadCallError: '{0}' ({0:?})")]
    ReadCall(#[from] ReadCallError),

    #[error("Invalid entity counter: {0}")]
    InvalidCounter(String),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ReadCall(err) => err.is_retryable(),
            SyncError::InvalidCounter(_) => false,
        }
    }
}
