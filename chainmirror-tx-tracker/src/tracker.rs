use std::{sync::Arc, time::Duration};

use chainmirror_config::TransactionsConfig;
use chainmirror_core::{BlobStore, Clock};
use chainmirror_metrics::metrics;
use log::*;
use tokio::sync::Mutex;

use crate::{
    error::{TxTrackerError, TxTrackerResult},
    types::{
        NewTransaction, TrackedTransaction, TransactionKind, TransactionStatus,
    },
};

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1_000;

/// Lifecycle history of write transactions, newest first.
///
/// Every mutation rewrites the full list under one blob store key. The
/// in-memory list stays authoritative when persisting fails, so a broken
/// store costs durability but never the current session's view.
/// Intended for a single process writing to its own store.
pub struct TransactionTracker {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    storage_key: String,
    retention: Duration,
    transactions: Mutex<Vec<TrackedTransaction>>,
}

impl TransactionTracker {
    /// Restores the persisted history. Anything unreadable starts empty.
    pub async fn load(
        store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        config: &TransactionsConfig,
    ) -> Self {
        let transactions = match store.get_item(&config.storage_key).await {
            Ok(Some(raw)) => {
                match serde_json::from_str::<Vec<TrackedTransaction>>(&raw) {
                    Ok(transactions) => transactions,
                    Err(err) => {
                        warn!(
                            "Discarding undecodable transaction history: {}",
                            err
                        );
                        vec![]
                    }
                }
            }
            Ok(None) => vec![],
            Err(err) => {
                error!("Failed to load transaction history: {:?}", err);
                vec![]
            }
        };
        debug!("Loaded {} tracked transactions", transactions.len());

        Self {
            store,
            clock,
            storage_key: config.storage_key.clone(),
            retention: Duration::from_millis(
                config.retention_days.saturating_mul(MILLIS_PER_DAY),
            ),
            transactions: Mutex::new(transactions),
        }
    }

    /// Adds `tx` as pending at the front of the history.
    pub async fn record(
        &self,
        tx: NewTransaction,
    ) -> TxTrackerResult<TrackedTransaction> {
        let mut transactions = self.transactions.lock().await;
        if transactions.iter().any(|t| t.id == tx.id) {
            return Err(TxTrackerError::AlreadyRecorded(tx.id));
        }

        let tracked = TrackedTransaction {
            id: tx.id,
            kind: tx.kind,
            status: TransactionStatus::Pending,
            created_at: self.clock.now_millis(),
            detail: tx.detail,
            error: None,
        };
        info!("Tracking {} transaction '{}'", tracked.kind, tracked.id);
        metrics::inc_transaction_status(
            tracked.kind.as_str(),
            tracked.status.as_str(),
        );
        transactions.insert(0, tracked.clone());
        self.persist(&transactions).await;

        Ok(tracked)
    }

    /// Replaces status and error of the transaction `id` in place.
    pub async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
        error: Option<String>,
    ) -> TxTrackerResult<TrackedTransaction> {
        let mut transactions = self.transactions.lock().await;
        let tracked = transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TxTrackerError::NotFound(id.to_string()))?;

        debug!(
            "Transaction '{}' {} -> {}",
            id, tracked.status, status
        );
        tracked.status = status;
        tracked.error = error;
        metrics::inc_transaction_status(
            tracked.kind.as_str(),
            status.as_str(),
        );
        let updated = tracked.clone();
        self.persist(&transactions).await;

        Ok(updated)
    }

    pub async fn all(&self) -> Vec<TrackedTransaction> {
        self.transactions.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<TrackedTransaction> {
        self.transactions
            .lock()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn pending(&self) -> Vec<TrackedTransaction> {
        self.filtered(|t| !t.status.is_settled()).await
    }

    pub async fn by_status(
        &self,
        status: TransactionStatus,
    ) -> Vec<TrackedTransaction> {
        self.filtered(|t| t.status == status).await
    }

    pub async fn by_kind(
        &self,
        kind: TransactionKind,
    ) -> Vec<TrackedTransaction> {
        self.filtered(|t| t.kind == kind).await
    }

    /// Drops transactions older than the configured retention.
    /// Never runs on its own.
    pub async fn prune(&self) -> usize {
        self.prune_older_than(self.retention).await
    }

    pub async fn prune_older_than(&self, age: Duration) -> usize {
        let age_millis = u64::try_from(age.as_millis()).unwrap_or(u64::MAX);
        let cutoff = self.clock.now_millis().saturating_sub(age_millis);
        let mut transactions = self.transactions.lock().await;
        let before = transactions.len();
        transactions.retain(|t| t.created_at >= cutoff);
        let removed = before - transactions.len();
        if removed > 0 {
            info!("Pruned {} transactions older than {:?}", removed, age);
            self.persist(&transactions).await;
        }
        removed
    }

    async fn filtered(
        &self,
        predicate: impl Fn(&TrackedTransaction) -> bool,
    ) -> Vec<TrackedTransaction> {
        self.transactions
            .lock()
            .await
            .iter()
            .filter(|t| predicate(t))
            .cloned()
            .collect()
    }

    async fn persist(&self, transactions: &[TrackedTransaction]) {
        let raw = match serde_json::to_string(transactions) {
            Ok(raw) => raw,
            Err(err) => {
                error!("Failed to encode transaction history: {}", err);
                return;
            }
        };
        if let Err(err) = self.store.set_item(&self.storage_key, raw).await {
            error!("Failed to persist transaction history: {:?}", err);
        }
    }
}
