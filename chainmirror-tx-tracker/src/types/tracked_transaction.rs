use chainmirror_core::UnixMillis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{TransactionKind, TransactionStatus};

/// Input to [crate::TransactionTracker::record].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub detail: Option<Value>,
}

impl NewTransaction {
    pub fn new(id: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// One entry of the persisted transaction history.
/// Only `status` and `error` ever change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub created_at: UnixMillis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
