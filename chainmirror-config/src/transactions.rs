use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TransactionsConfig {
    /// Blob store key holding the full transaction history.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Age after which an explicit prune removes a transaction.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_storage_key() -> String {
    "transaction_history".to_string()
}

fn default_retention_days() -> u64 {
    7
}
