mod args;
mod client;
mod errors;
mod http;
mod transport;
pub mod utils;
mod write;

#[cfg(any(test, feature = "dev-context"))]
pub mod testing;

pub use args::{admission_key, CallArg};
pub use client::ReadCallClient;
pub use errors::{
    ReadCallError, ReadCallResult, TransportError, TransportResult,
};
pub use http::{HttpReadCallTransport, HttpWriteCallTransport};
pub use transport::{ReadCallRequest, ReadCallTransport};
pub use utils::{retry_with_backoff, retry_with_backoff_when};
pub use write::{BroadcastOutcome, SignedTransaction, WriteCallTransport};
