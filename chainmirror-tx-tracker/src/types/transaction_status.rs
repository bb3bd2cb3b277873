use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TxTrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Broadcast, or about to be, and not yet settled.
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        use TransactionStatus::*;
        match self {
            Pending => "pending",
            Confirmed => "confirmed",
            Failed => "failed",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = TxTrackerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        use TransactionStatus::*;
        match value {
            "pending" => Ok(Pending),
            "confirmed" => Ok(Confirmed),
            "failed" => Ok(Failed),
            _ => Err(TxTrackerError::InvalidTransactionStatus(
                value.to_string(),
            )),
        }
    }
}
