use thiserror::Error;

pub type NodeResult<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] chainmirror_config::ConfigError),

    #[error("Blob store error: {0}")]
    BlobStoreError(#[from] chainmirror_core::BlobStoreError),

    #[error("Sync error: {0}")]
    SyncError(#[from] chainmirror_sync::SyncError),

    #[error("Transaction tracker error: {0}")]
    TxTrackerError(#[from] chainmirror_tx_tracker::TxTrackerError),

    #[error("Invalid transaction payload: {0}")]
    InvalidPayload(String),
}
