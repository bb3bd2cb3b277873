//! In-memory transports for exercising the read and write paths without a
//! node.
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use log::*;
use serde_json::Value;

use crate::{
    args::{admission_key, CallArg},
    errors::{TransportError, TransportResult},
    transport::{ReadCallRequest, ReadCallTransport},
    write::{BroadcastOutcome, SignedTransaction, WriteCallTransport},
};

const POISONED_MUTEX_MSG: &str = "Transport mock mutex poisoned";

/// Failure a mock call should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    Rejected(String),
    Unavailable(String),
    Status(u16),
}

impl From<&MockFailure> for TransportError {
    fn from(failure: &MockFailure) -> Self {
        match failure {
            MockFailure::Rejected(cause) => TransportError::Rejected {
                cause: cause.clone(),
            },
            MockFailure::Unavailable(msg) => {
                TransportError::Unavailable(msg.clone())
            }
            MockFailure::Status(status) => TransportError::Status {
                status: *status,
                body: String::new(),
            },
        }
    }
}

// -----------------
// ReadCallTransportMock
// -----------------
#[derive(Default)]
struct ReadMockState {
    /// Keyed by either an admission key or a bare function name
    responses: HashMap<String, Value>,
    failures: HashMap<String, MockFailure>,
    delays: HashMap<String, Duration>,
    calls: HashMap<String, u64>,
    requests: Vec<ReadCallRequest>,
}

impl ReadMockState {
    /// Exact `function:args` entries win over function-wide ones.
    fn lookup<'a, T>(
        map: &'a HashMap<String, T>,
        key: &str,
        function_name: &str,
    ) -> Option<&'a T> {
        map.get(key).or_else(|| map.get(function_name))
    }
}

#[derive(Default)]
pub struct ReadCallTransportMockBuilder {
    state: ReadMockState,
}

impl ReadCallTransportMockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call of `function_name` with `value`.
    pub fn response(mut self, function_name: &str, value: Value) -> Self {
        self.state
            .responses
            .insert(function_name.to_string(), value);
        self
    }

    /// Answers calls of `function_name` with exactly `args`.
    pub fn response_for(
        mut self,
        function_name: &str,
        args: &[CallArg],
        value: Value,
    ) -> Self {
        self.state
            .responses
            .insert(admission_key(function_name, args), value);
        self
    }

    pub fn failure(
        mut self,
        function_name: &str,
        failure: MockFailure,
    ) -> Self {
        self.state
            .failures
            .insert(function_name.to_string(), failure);
        self
    }

    pub fn failure_for(
        mut self,
        function_name: &str,
        args: &[CallArg],
        failure: MockFailure,
    ) -> Self {
        self.state
            .failures
            .insert(admission_key(function_name, args), failure);
        self
    }

    /// Delays every call of `function_name` before it answers.
    pub fn delay(mut self, function_name: &str, delay: Duration) -> Self {
        self.state.delays.insert(function_name.to_string(), delay);
        self
    }

    pub fn build(self) -> ReadCallTransportMock {
        ReadCallTransportMock {
            state: Arc::new(Mutex::new(self.state)),
        }
    }
}

#[derive(Clone, Default)]
pub struct ReadCallTransportMock {
    state: Arc<Mutex<ReadMockState>>,
}

impl ReadCallTransportMock {
    pub fn set_response(&self, function_name: &str, value: Value) {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .responses
            .insert(function_name.to_string(), value);
    }

    pub fn set_response_for(
        &self,
        function_name: &str,
        args: &[CallArg],
        value: Value,
    ) {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .responses
            .insert(admission_key(function_name, args), value);
    }

    pub fn set_failure_for(
        &self,
        function_name: &str,
        args: &[CallArg],
        failure: MockFailure,
    ) {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .failures
            .insert(admission_key(function_name, args), failure);
    }

    pub fn clear_failures(&self) {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .failures
            .clear();
    }

    /// Number of calls made to `function_name`, whatever their arguments.
    pub fn call_count(&self, function_name: &str) -> u64 {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .calls
            .get(function_name)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> u64 {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .calls
            .values()
            .sum()
    }

    pub fn requests(&self) -> Vec<ReadCallRequest> {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .requests
            .clone()
    }
}

#[async_trait]
impl ReadCallTransport for ReadCallTransportMock {
    async fn call_read(
        &self,
        request: &ReadCallRequest,
    ) -> TransportResult<Value> {
        let function_name = request.function_name.as_str();
        let key = admission_key(function_name, &request.arguments);
        let (delay, outcome) = {
            let mut state = self.state.lock().expect(POISONED_MUTEX_MSG);
            *state.calls.entry(function_name.to_string()).or_default() += 1;
            state.requests.push(request.clone());

            let delay = state.delays.get(function_name).copied();
            let outcome = if let Some(failure) =
                ReadMockState::lookup(&state.failures, &key, function_name)
            {
                Err(TransportError::from(failure))
            } else if let Some(value) =
                ReadMockState::lookup(&state.responses, &key, function_name)
            {
                Ok(value.clone())
            } else {
                warn!("No mock response for '{}'", key);
                Err(TransportError::Unavailable(format!(
                    "no mock response for '{key}'"
                )))
            };
            (delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

// -----------------
// WriteCallTransportMock
// -----------------
#[derive(Default)]
struct WriteMockState {
    outcomes: VecDeque<Result<BroadcastOutcome, MockFailure>>,
    broadcasts: Vec<SignedTransaction>,
}

/// Answers broadcasts from a queue of prepared outcomes, accepting with a
/// txid derived from the payload once the queue is empty.
#[derive(Clone, Default)]
pub struct WriteCallTransportMock {
    state: Arc<Mutex<WriteMockState>>,
}

impl WriteCallTransportMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, outcome: BroadcastOutcome) {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .outcomes
            .push_back(Ok(outcome));
    }

    pub fn push_failure(&self, failure: MockFailure) {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .outcomes
            .push_back(Err(failure));
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.state
            .lock()
            .expect(POISONED_MUTEX_MSG)
            .broadcasts
            .clone()
    }
}

#[async_trait]
impl WriteCallTransport for WriteCallTransportMock {
    async fn broadcast(
        &self,
        transaction: &SignedTransaction,
    ) -> TransportResult<BroadcastOutcome> {
        let mut state = self.state.lock().expect(POISONED_MUTEX_MSG);
        state.broadcasts.push(transaction.clone());
        match state.outcomes.pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(failure)) => Err(TransportError::from(&failure)),
            None => Ok(BroadcastOutcome::Accepted {
                txid: format!("0x{}", hex::encode(transaction.as_bytes())),
            }),
        }
    }
}
