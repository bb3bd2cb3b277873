use std::{fmt, future::Future, io};

use log::*;
use tokio::signal;

/// The process signal that ended `watch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> io::Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    first_signal(signal::ctrl_c(), async move { terminate.recv().await })
        .await
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> io::Result<ShutdownSignal> {
    first_signal(signal::ctrl_c(), std::future::pending()).await
}

/// Resolves with whichever signal arrives first. A terminate stream that
/// closes without delivering is ignored and only the interrupt counts.
async fn first_signal(
    interrupt: impl Future<Output = io::Result<()>>,
    terminate: impl Future<Output = Option<()>>,
) -> io::Result<ShutdownSignal> {
    let terminate = async {
        if terminate.await.is_none() {
            warn!("Terminate signal stream closed");
            std::future::pending::<()>().await;
        }
    };
    let signal = tokio::select! {
        res = interrupt => {
            res?;
            ShutdownSignal::Interrupt
        }
        _ = terminate => ShutdownSignal::Terminate,
    };
    info!("{} received, initiating graceful shutdown", signal);
    Ok(signal)
}
