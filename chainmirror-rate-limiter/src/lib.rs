mod error;
mod limiter;

pub use error::{RateLimiterError, RateLimiterResult};
pub use limiter::RateLimiter;
