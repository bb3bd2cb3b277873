use std::{sync::Arc, time::Duration};

use chainmirror_config::RemoteConfig;
use chainmirror_metrics::metrics::{self, Outcome};
use chainmirror_rate_limiter::RateLimiter;
use log::*;
use serde_json::Value;

use crate::{
    args::{admission_key, CallArg},
    errors::{ReadCallError, ReadCallResult},
    transport::{ReadCallRequest, ReadCallTransport},
};

/// Issues read-only contract calls through the shared [RateLimiter].
///
/// The contract address and name are fixed at construction. Each call is
/// bounded by the configured timeout once admitted. Responses are returned
/// raw so callers can normalize them as their shape requires.
#[derive(Clone)]
pub struct ReadCallClient {
    transport: Arc<dyn ReadCallTransport>,
    limiter: RateLimiter,
    contract_address: String,
    contract_name: String,
    default_sender: String,
    timeout: Duration,
}

impl ReadCallClient {
    pub fn new(
        transport: Arc<dyn ReadCallTransport>,
        limiter: RateLimiter,
        config: &RemoteConfig,
    ) -> Self {
        Self {
            transport,
            limiter,
            contract_address: config.contract_address.clone(),
            contract_name: config.contract_name.clone(),
            default_sender: config.default_sender().to_string(),
            timeout: config.request_timeout(),
        }
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub async fn call(
        &self,
        function_name: &str,
        args: &[CallArg],
        sender: Option<&str>,
    ) -> ReadCallResult<Value> {
        let key = admission_key(function_name, args);
        let request = ReadCallRequest {
            contract_address: self.contract_address.clone(),
            contract_name: self.contract_name.clone(),
            function_name: function_name.to_string(),
            arguments: args.to_vec(),
            sender: sender.unwrap_or(&self.default_sender).to_string(),
        };
        let transport = self.transport.clone();
        let timeout = self.timeout;

        let settled = self
            .limiter
            .execute(key, move || async move {
                let _timer = metrics::read_call_timer(&request.function_name);
                tokio::time::timeout(timeout, transport.call_read(&request))
                    .await
            })
            .await?;

        match settled {
            Ok(Ok(value)) => {
                metrics::inc_read_call(function_name, &Outcome::Success);
                Ok(value)
            }
            Ok(Err(err)) => {
                let outcome = if err.is_rejection() {
                    Outcome::Rejected
                } else {
                    Outcome::Error
                };
                metrics::inc_read_call(function_name, &outcome);
                debug!("Read call '{}' failed: {}", function_name, err);
                Err(ReadCallError::Transport(err))
            }
            Err(_elapsed) => {
                metrics::inc_read_call(function_name, &Outcome::Timeout);
                metrics::inc_read_call_timeout();
                warn!(
                    "Read call '{}' timed out after {:?}",
                    function_name, timeout
                );
                Err(ReadCallError::Timeout {
                    function_name: function_name.to_string(),
                    timeout,
                })
            }
        }
    }
}
