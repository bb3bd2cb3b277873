use async_trait::async_trait;

use crate::errors::TransportResult;

/// A fully signed, serialized transaction ready for broadcast.
/// Construction and signing happen outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    bytes: Vec<u8>,
}

impl SignedTransaction {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        Ok(Self::new(hex::decode(trimmed)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Accepted { txid: String },
    Rejected {
        error: String,
        reason: Option<String>,
    },
}

impl BroadcastOutcome {
    /// Human readable reason for a rejection, if any.
    pub fn rejection_message(&self) -> Option<String> {
        match self {
            BroadcastOutcome::Accepted { .. } => None,
            BroadcastOutcome::Rejected {
                error,
                reason: Some(reason),
            } => Some(format!("{error}: {reason}")),
            BroadcastOutcome::Rejected {
                error,
                reason: None,
            } => Some(error.clone()),
        }
    }
}

#[async_trait]
pub trait WriteCallTransport: Send + Sync + 'static {
    async fn broadcast(
        &self,
        transaction: &SignedTransaction,
    ) -> TransportResult<BroadcastOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_transaction_from_hex() {
        let tx = SignedTransaction::from_hex("0x0a0b").unwrap();
        assert_eq!(tx.as_bytes(), &[0x0a, 0x0b]);
        assert!(SignedTransaction::from_hex("zz").is_err());
    }

    #[test]
    fn test_rejection_message() {
        let rejected = BroadcastOutcome::Rejected {
            error: "transaction rejected".to_string(),
            reason: Some("NotEnoughFunds".to_string()),
        };
        assert_eq!(
            rejected.rejection_message().as_deref(),
            Some("transaction rejected: NotEnoughFunds")
        );
        let accepted = BroadcastOutcome::Accepted {
            txid: "0x01".to_string(),
        };
        assert_eq!(accepted.rejection_message(), None);
    }
}
