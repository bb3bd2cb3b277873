use async_trait::async_trait;
use serde_json::Value;

use crate::{args::CallArg, errors::TransportResult};

/// Everything a transport needs to perform one read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCallRequest {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: String,
    pub arguments: Vec<CallArg>,
    pub sender: String,
}

/// Performs read-only contract calls against the remote ledger and returns
/// the raw tagged-value tree of the result.
#[async_trait]
pub trait ReadCallTransport: Send + Sync + 'static {
    async fn call_read(&self, request: &ReadCallRequest)
        -> TransportResult<Value>;
}
