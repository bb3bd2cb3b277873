use chainmirror_rpc_client::TransportError;
use thiserror::Error;

pub type TxTrackerResult<T> = Result<T, TxTrackerError>;

#[derive(Error, Debug)]
pub enum TxTrackerError {
    #[error("Transaction not found: '{0}'")]
    NotFound(String),

    #[error("Transaction already recorded: '{0}'")]
    AlreadyRecorded(String),

    #[error("Invalid Transaction Kind: '{0}' ({0:?})")]
    InvalidTransactionKind(String),

    #[error("Invalid Transaction Status: '{0}' ({0:?})")]
    InvalidTransactionStatus(String),

    #[error("BroadcastError: '{0}' ({0:?})")]
    Broadcast(#[from] TransportError),
}
