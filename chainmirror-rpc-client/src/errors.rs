use std::time::Duration;

use chainmirror_rate_limiter::RateLimiterError;
use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;
pub type ReadCallResult<T> = Result<T, ReadCallError>;

// -----------------
// TransportError
// -----------------
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0} ({0:?})")]
    Http(#[from] reqwest::Error),

    #[error("Remote answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The contract call itself was refused by the remote.
    #[error("Call rejected by remote: {cause}")]
    Rejected { cause: String },

    #[error("Remote unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(err) if err.is_timeout())
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, TransportError::Rejected { .. })
    }

    /// Network hiccups, throttling and server-side faults are worth another
    /// attempt. Rejections and undecodable payloads will not change.
    pub fn is_retryable(&self) -> bool {
        use TransportError::*;
        match self {
            Http(err) => {
                err.is_timeout() || err.is_connect() || err.is_request()
            }
            Status { status, .. } => *status == 429 || *status >= 500,
            Unavailable(_) => true,
            Decode(_) | Rejected { .. } => false,
        }
    }
}

// -----------------
// ReadCallError
// -----------------
#[derive(Error, Debug)]
pub enum ReadCallError {
    #[error(
        "Request timed out: '{function_name}' did not settle within {timeout:?}, the network or contract may be unreachable"
    )]
    Timeout {
        function_name: String,
        timeout: Duration,
    },

    #[error("TransportError: '{0}' ({0:?})")]
    Transport(#[from] TransportError),

    #[error("RateLimiterError: '{0}' ({0:?})")]
    RateLimiter(#[from] RateLimiterError),
}

impl ReadCallError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ReadCallError::Timeout { .. } => true,
            ReadCallError::Transport(err) => err.is_timeout(),
            ReadCallError::RateLimiter(_) => false,
        }
    }

    /// True when the remote refused the call, as opposed to the call not
    /// reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ReadCallError::Transport(err) if err.is_rejection())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ReadCallError::Timeout { .. } => true,
            ReadCallError::Transport(err) => err.is_retryable(),
            ReadCallError::RateLimiter(_) => false,
        }
    }
}
