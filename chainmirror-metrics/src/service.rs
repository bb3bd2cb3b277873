use std::net::SocketAddr;

use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::{
    body::Bytes, server::conn::http1, service::service_fn, Method, Request,
    Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use log::*;
use tokio::{net::TcpListener, select, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::metrics;

/// Binds `addr` and serves `GET /metrics` until the token is cancelled.
pub async fn try_start_metrics_service(
    addr: SocketAddr,
    cancellation_token: CancellationToken,
) -> std::io::Result<MetricsService> {
    metrics::register();
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!("Metrics server listening on {}", local_addr);

    let handle = tokio::spawn(run_metrics_server(listener, cancellation_token));
    Ok(MetricsService {
        local_addr,
        handle,
    })
}

pub struct MetricsService {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MetricsService {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the server loop to observe cancellation and exit.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            error!("Metrics server task failed: {:?}", err);
        }
    }
}

async fn run_metrics_server(
    listener: TcpListener,
    cancellation_token: CancellationToken,
) {
    loop {
        select!(
            _ = cancellation_token.cancelled() => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        tokio::task::spawn(async move {
                            if let Err(err) = http1::Builder::new()
                                .serve_connection(
                                    io,
                                    service_fn(metrics_service_router),
                                )
                                .await
                            {
                                debug!("Metrics connection closed: {:?}", err);
                            }
                        });
                    }
                    Err(err) => {
                        error!("Failed to accept connection: {:?}", err)
                    }
                };
            }
        );
    }

    info!("Metrics server shutdown");
}

async fn metrics_service_router(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    trace!("{} {}", req.method(), req.uri().path());
    let result = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            Ok(Response::new(full(metrics::encode_registry())))
        }
        _ => {
            let mut not_found = Response::new(empty());
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    };
    // Drain the request body so the connection can be reused
    let mut body = req.into_body();
    while (body.frame().await).is_some() {}

    result
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}
