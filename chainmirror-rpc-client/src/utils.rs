use std::{fmt::Debug, future::Future, ops::ControlFlow, time::Duration};

use log::*;
use tokio::time::sleep;

/// Runs `make_fut` up to `max_attempts` times, doubling the pause between
/// attempts starting at `initial_delay`. Returns the last error once the
/// attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    make_fut: F,
    max_attempts: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Debug,
{
    retry_with_backoff_when(make_fut, max_attempts, initial_delay, |_| true)
        .await
}

/// Like [retry_with_backoff] but gives up immediately on errors for which
/// `should_retry` returns false.
pub async fn retry_with_backoff_when<F, Fut, T, E>(
    make_fut: F,
    max_attempts: usize,
    initial_delay: Duration,
    should_retry: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Debug,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    let mut delay = initial_delay;

    loop {
        attempt += 1;

        let err = match make_fut().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let sleep_duration =
            match decide_flow(attempt, max_attempts, delay, should_retry(&err))
            {
                ControlFlow::Continue(value) => value,
                ControlFlow::Break(()) => return Err(err),
            };

        debug!(
            "Attempt {}/{} failed: {:?}, retrying in {:?}",
            attempt, max_attempts, err, sleep_duration
        );
        sleep(sleep_duration).await;
        delay = delay.saturating_mul(2);
    }
}

fn decide_flow(
    attempt: usize,
    max_attempts: usize,
    delay: Duration,
    retryable: bool,
) -> ControlFlow<(), Duration> {
    if !retryable || attempt >= max_attempts {
        ControlFlow::Break(())
    } else {
        ControlFlow::Continue(delay)
    }
}
