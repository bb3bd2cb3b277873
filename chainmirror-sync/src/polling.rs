use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::*;
use tokio::{
    select,
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Lifecycle of the host application as reported by its environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Active,
    Inactive,
    Background,
}

impl AppState {
    pub fn is_foreground(&self) -> bool {
        matches!(self, AppState::Active)
    }
}

/// Whatever the driver should run on every poll.
#[async_trait]
pub trait Refresher: Send + Sync + 'static {
    async fn refresh(&self);
}

/// Runs a [Refresher] on a fixed interval while the host is in the
/// foreground.
///
/// Polling stops entirely while the host is in the background. Returning to
/// the foreground triggers one immediate refresh, after which the regular
/// interval resumes.
pub struct PollingDriver {
    interval: Duration,
    refresher: Arc<dyn Refresher>,
    lifecycle: watch::Receiver<AppState>,
    cancellation_token: CancellationToken,
}

impl PollingDriver {
    pub fn new(
        interval: Duration,
        refresher: Arc<dyn Refresher>,
        lifecycle: watch::Receiver<AppState>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            interval,
            refresher,
            lifecycle,
            cancellation_token,
        }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut foreground = self.lifecycle.borrow_and_update().is_foreground();
        info!(
            "Polling every {:?}, starting in {}",
            self.interval,
            if foreground { "foreground" } else { "background" }
        );

        loop {
            if foreground {
                select! {
                    _ = self.cancellation_token.cancelled() => break,
                    _ = ticker.tick() => {
                        trace!("Polling tick");
                        self.refresher.refresh().await;
                    }
                    changed = self.lifecycle.changed() => {
                        if changed.is_err() {
                            debug!("Lifecycle signal closed, stopping polling");
                            break;
                        }
                        if !self.lifecycle.borrow_and_update().is_foreground() {
                            info!("Host went to background, pausing polling");
                            foreground = false;
                        }
                    }
                }
            } else {
                select! {
                    _ = self.cancellation_token.cancelled() => break,
                    changed = self.lifecycle.changed() => {
                        if changed.is_err() {
                            debug!("Lifecycle signal closed, stopping polling");
                            break;
                        }
                        if self.lifecycle.borrow_and_update().is_foreground() {
                            info!("Host returned to foreground, refreshing");
                            foreground = true;
                            self.refresher.refresh().await;
                            ticker.reset();
                        }
                    }
                }
            }
        }

        info!("Polling stopped");
    }
}
