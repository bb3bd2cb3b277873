use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TxTrackerError;

/// The user action a write transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Registration,
    Creation,
    Submission,
    Vote,
    Finalize,
    Fund,
    Seal,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 7] = [
        TransactionKind::Registration,
        TransactionKind::Creation,
        TransactionKind::Submission,
        TransactionKind::Vote,
        TransactionKind::Finalize,
        TransactionKind::Fund,
        TransactionKind::Seal,
    ];

    pub fn as_str(&self) -> &str {
        use TransactionKind::*;
        match self {
            Registration => "registration",
            Creation => "creation",
            Submission => "submission",
            Vote => "vote",
            Finalize => "finalize",
            Fund => "fund",
            Seal => "seal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = TxTrackerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        TransactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                TxTrackerError::InvalidTransactionKind(value.to_string())
            })
    }
}
