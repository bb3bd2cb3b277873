mod error;
mod submitter;
mod tracker;
mod types;

pub use error::{TxTrackerError, TxTrackerResult};
pub use submitter::TransactionSubmitter;
pub use tracker::TransactionTracker;
pub use types::{
    NewTransaction, TrackedTransaction, TransactionKind, TransactionStatus,
};
