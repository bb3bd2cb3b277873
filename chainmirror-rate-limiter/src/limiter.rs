use std::{
    collections::VecDeque,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex},
    time::Duration,
};

use chainmirror_config::RateLimitConfig;
use chainmirror_metrics::metrics;
use futures_util::{future::BoxFuture, FutureExt};
use log::*;
use tokio::{sync::oneshot, time::Instant};

use crate::error::{RateLimiterError, RateLimiterResult};

const POISONED_MUTEX_MSG: &str = "RateLimiter state mutex poisoned";

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

struct QueuedRequest {
    admission_key: String,
    enqueued_at: Instant,
    job: Job,
}

#[derive(Default)]
struct State {
    queue: VecDeque<QueuedRequest>,
    /// Admission timestamps inside the trailing window, oldest first
    window: VecDeque<Instant>,
    processing: bool,
}

struct Inner {
    window: Duration,
    max_requests: usize,
    inter_request_delay: Duration,
    safety_margin: Duration,
    state: Mutex<State>,
}

/// Sliding-window admission control in front of a single FIFO queue.
///
/// All clones share one queue and one window, so every caller in the
/// process draws from the same budget. Operations run strictly one at a
/// time in submission order. The admission key only labels log output.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                window: config.window(),
                max_requests: config.max_requests.max(1),
                inter_request_delay: config.inter_request_delay(),
                safety_margin: config.safety_margin(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Enqueues `operation` immediately and returns a future resolving to
    /// its output once it has been admitted and executed.
    ///
    /// The request takes its place in the queue when this method is called,
    /// not when the returned future is first polled.
    pub fn execute<T, F, Fut>(
        &self,
        admission_key: impl Into<String>,
        operation: F,
    ) -> impl Future<Output = RateLimiterResult<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let admission_key = admission_key.into();
        let (tx, rx) = oneshot::channel();

        let job_key = admission_key.clone();
        let job: Job = Box::new(move || {
            async move {
                let run = async move { operation().await };
                match AssertUnwindSafe(run).catch_unwind().await {
                    Ok(output) => {
                        // The caller may have dropped its future
                        let _ = tx.send(output);
                    }
                    Err(_) => {
                        error!("Operation '{}' panicked", job_key);
                    }
                }
            }
            .boxed()
        });

        self.enqueue(QueuedRequest {
            admission_key: admission_key.clone(),
            enqueued_at: Instant::now(),
            job,
        });

        async move {
            rx.await
                .map_err(|_| RateLimiterError::OperationAborted(admission_key))
        }
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().expect(POISONED_MUTEX_MSG).queue.len()
    }

    /// Admissions currently counted against the window, without pruning.
    pub fn window_occupancy(&self) -> usize {
        self.inner.state.lock().expect(POISONED_MUTEX_MSG).window.len()
    }

    fn enqueue(&self, request: QueuedRequest) {
        let start_drain = {
            let mut state = self.inner.state.lock().expect(POISONED_MUTEX_MSG);
            trace!("Queueing '{}'", request.admission_key);
            state.queue.push_back(request);
            metrics::set_limiter_queue_depth(state.queue.len());
            if state.processing {
                false
            } else {
                state.processing = true;
                true
            }
        };
        if start_drain {
            let inner = self.inner.clone();
            tokio::spawn(async move { inner.drain().await });
        }
    }
}

impl Inner {
    async fn drain(self: Arc<Self>) {
        loop {
            let request = {
                let mut state = self.state.lock().expect(POISONED_MUTEX_MSG);
                match state.queue.pop_front() {
                    Some(request) => {
                        metrics::set_limiter_queue_depth(state.queue.len());
                        request
                    }
                    None => {
                        state.processing = false;
                        return;
                    }
                }
            };

            self.wait_for_admission(&request.admission_key).await;
            metrics::observe_admission_wait(
                request.enqueued_at.elapsed().as_secs_f64(),
            );

            debug!("Executing '{}'", request.admission_key);
            (request.job)().await;

            if !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }
        }
    }

    /// Returns once a slot in the window has been claimed for `now`.
    async fn wait_for_admission(&self, admission_key: &str) {
        loop {
            let wait = {
                let mut state = self.state.lock().expect(POISONED_MUTEX_MSG);
                let now = Instant::now();
                while let Some(oldest) = state.window.front() {
                    if now.duration_since(*oldest) >= self.window {
                        state.window.pop_front();
                    } else {
                        break;
                    }
                }

                if state.window.len() < self.max_requests {
                    state.window.push_back(now);
                    metrics::set_limiter_window_occupancy(state.window.len());
                    None
                } else {
                    // Non-empty since max_requests >= 1
                    let oldest = state.window.front().copied().unwrap_or(now);
                    let exits_at = oldest + self.window;
                    Some(exits_at.saturating_duration_since(now))
                }
            };

            match wait {
                None => return,
                Some(wait) => {
                    let wait = wait + self.safety_margin;
                    debug!(
                        "Window full, '{}' waits {}ms for admission",
                        admission_key,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn limiter(max_requests: usize, delay_millis: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_millis: 1_000,
            max_requests,
            inter_request_delay_millis: delay_millis,
            safety_margin_millis: 10,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_returned_and_queue_keeps_draining() {
        let limiter = limiter(5, 0);
        let failing = limiter
            .execute("fail", || async { Err::<u8, _>("boom".to_string()) });
        let succeeding =
            limiter.execute("ok", || async { Ok::<_, String>(7u8) });

        assert_matches!(failing.await, Ok(Err(msg)) if msg == "boom");
        assert_matches!(succeeding.await, Ok(Ok(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_operation_is_reported_as_aborted() {
        let limiter = limiter(5, 0);
        let panicking = limiter.execute("panics", || async {
            if true {
                panic!("operation exploded");
            }
            1u8
        });
        let next = limiter.execute("next", || async { 2u8 });

        assert_matches!(
            panicking.await,
            Err(RateLimiterError::OperationAborted(key)) if key == "panics"
        );
        assert_matches!(next.await, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inter_request_delay_separates_executions() {
        let limiter = limiter(5, 100);
        let first = limiter.execute("a", || async { Instant::now() });
        let second = limiter.execute("b", || async { Instant::now() });

        let first = first.await.unwrap();
        let second = second.await.unwrap();
        assert!(second.duration_since(first) >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_limiter_stops_processing() {
        let limiter = limiter(2, 0);
        limiter.execute("a", || async {}).await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(limiter.queue_len(), 0);
        assert_eq!(limiter.window_occupancy(), 1);
        assert!(!limiter.inner.state.lock().unwrap().processing);
    }
}
