use std::sync::Arc;

use chainmirror_rpc_client::{
    BroadcastOutcome, SignedTransaction, WriteCallTransport,
};
use log::*;
use serde_json::Value;

use crate::{
    error::TxTrackerResult,
    tracker::TransactionTracker,
    types::{
        NewTransaction, TrackedTransaction, TransactionKind, TransactionStatus,
    },
};

/// Ties a broadcast to its tracked lifecycle.
///
/// A transaction is recorded as pending before it is broadcast, so a crash
/// in between still leaves a trace. Accepted broadcasts stay pending until
/// [Self::confirm] or [Self::fail] is called by whoever observes the chain.
#[derive(Clone)]
pub struct TransactionSubmitter {
    tracker: Arc<TransactionTracker>,
    transport: Arc<dyn WriteCallTransport>,
}

impl TransactionSubmitter {
    pub fn new(
        tracker: Arc<TransactionTracker>,
        transport: Arc<dyn WriteCallTransport>,
    ) -> Self {
        Self { tracker, transport }
    }

    pub fn tracker(&self) -> &Arc<TransactionTracker> {
        &self.tracker
    }

    pub async fn submit(
        &self,
        id: impl Into<String>,
        kind: TransactionKind,
        transaction: &SignedTransaction,
        detail: Option<Value>,
    ) -> TxTrackerResult<BroadcastOutcome> {
        let id = id.into();
        self.tracker
            .record(NewTransaction {
                id: id.clone(),
                kind,
                detail,
            })
            .await?;

        match self.transport.broadcast(transaction).await {
            Ok(outcome @ BroadcastOutcome::Accepted { .. }) => {
                debug!("Broadcast of '{}' accepted", id);
                Ok(outcome)
            }
            Ok(outcome @ BroadcastOutcome::Rejected { .. }) => {
                let reason = outcome.rejection_message();
                warn!("Broadcast of '{}' rejected: {:?}", id, reason);
                self.tracker
                    .update_status(&id, TransactionStatus::Failed, reason)
                    .await?;
                Ok(outcome)
            }
            Err(err) => {
                error!("Broadcast of '{}' failed: {}", id, err);
                self.tracker
                    .update_status(
                        &id,
                        TransactionStatus::Failed,
                        Some(err.to_string()),
                    )
                    .await?;
                Err(err.into())
            }
        }
    }

    pub async fn confirm(
        &self,
        id: &str,
    ) -> TxTrackerResult<TrackedTransaction> {
        self.tracker
            .update_status(id, TransactionStatus::Confirmed, None)
            .await
    }

    pub async fn fail(
        &self,
        id: &str,
        error: impl Into<String>,
    ) -> TxTrackerResult<TrackedTransaction> {
        self.tracker
            .update_status(id, TransactionStatus::Failed, Some(error.into()))
            .await
    }
}
