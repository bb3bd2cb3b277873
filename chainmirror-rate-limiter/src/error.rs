use thiserror::Error;

pub type RateLimiterResult<T> = Result<T, RateLimiterError>;

#[derive(Error, Debug)]
pub enum RateLimiterError {
    /// The queued operation panicked before producing a value.
    #[error("Operation for '{0}' was aborted before it settled")]
    OperationAborted(String),
}
