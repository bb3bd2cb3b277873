use std::{fs, sync::Arc};

use chainmirror_cache::TtlCache;
use chainmirror_config::ChainMirrorConfig;
use chainmirror_core::{BlobStore, Clock, SqliteBlobStore, SystemClock};
use chainmirror_metrics::{try_start_metrics_service, MetricsService};
use chainmirror_rate_limiter::RateLimiter;
use chainmirror_rpc_client::{
    HttpReadCallTransport, HttpWriteCallTransport, ReadCallClient,
};
use chainmirror_sync::{
    AppState, EntityStateStore, PollingDriver, SyncCoordinator,
};
use chainmirror_tx_tracker::{TransactionSubmitter, TransactionTracker};
use log::*;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::errors::NodeResult;

/// Every service of the mirror, wired from one [ChainMirrorConfig].
pub struct ChainMirror {
    config: ChainMirrorConfig,
    clock: Arc<dyn Clock>,
    coordinator: SyncCoordinator,
    submitter: TransactionSubmitter,
    token: CancellationToken,
    lifecycle: watch::Sender<AppState>,
    metrics_service: Option<MetricsService>,
    polling_handle: Option<JoinHandle<()>>,
}

impl ChainMirror {
    pub async fn try_from_config(
        config: ChainMirrorConfig,
    ) -> NodeResult<Self> {
        let store = Self::open_store(&config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let limiter = RateLimiter::new(&config.rate_limit);
        let client = ReadCallClient::new(
            Arc::new(HttpReadCallTransport::new(config.remote.url.clone())),
            limiter,
            &config.remote,
        );
        let cache = TtlCache::new(store.clone(), clock.clone(), &config.cache);
        let coordinator = SyncCoordinator::new(
            client,
            cache,
            EntityStateStore::new(),
            &config.sync,
        );

        let tracker = Arc::new(
            TransactionTracker::load(
                store.clone(),
                clock.clone(),
                &config.transactions,
            )
            .await,
        );
        let submitter = TransactionSubmitter::new(
            tracker,
            Arc::new(HttpWriteCallTransport::new(config.remote.url.clone())),
        );

        let (lifecycle, _) = watch::channel(AppState::Active);
        Ok(Self {
            config,
            clock,
            coordinator,
            submitter,
            token: CancellationToken::new(),
            lifecycle,
            metrics_service: None,
            polling_handle: None,
        })
    }

    fn open_store(
        config: &ChainMirrorConfig,
    ) -> NodeResult<Arc<dyn BlobStore>> {
        let path = &config.storage.path;
        if config.storage.reset && path.exists() {
            info!("Resetting blob store at {}", path.display());
            fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Arc::new(SqliteBlobStore::new(path)?))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    pub fn tracker(&self) -> &Arc<TransactionTracker> {
        self.submitter.tracker()
    }

    /// Lifecycle updates reach the polling driver through this sender.
    pub fn lifecycle(&self) -> &watch::Sender<AppState> {
        &self.lifecycle
    }

    // -----------------
    // Services
    // -----------------
    pub async fn start_metrics_service(&mut self) -> NodeResult<()> {
        if !self.config.metrics.enabled {
            debug!("Metrics service disabled");
            return Ok(());
        }
        let service = try_start_metrics_service(
            self.config.metrics.addr,
            self.token.clone(),
        )
        .await?;
        info!("Serving metrics on http://{}/metrics", service.local_addr());
        self.metrics_service.replace(service);
        Ok(())
    }

    pub fn start_polling(&mut self) {
        let driver = PollingDriver::new(
            self.config.polling.interval(),
            Arc::new(self.coordinator.clone()),
            self.lifecycle.subscribe(),
            self.token.clone(),
        );
        self.polling_handle.replace(driver.start());
        info!("Polling every {:?}", self.config.polling.interval());
    }

    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.polling_handle.take() {
            if let Err(err) = handle.await {
                error!("Polling driver exited abnormally: {:?}", err);
            }
        }
        if let Some(service) = self.metrics_service.take() {
            service.join().await;
        }
        info!("Chainmirror stopped");
    }
}
