//! The HTTP gateway in front of the ledger.
//!
//! Each accepted connection is served on its own task with hyper's HTTP/1 server, so requests from
//! different clients reach the ledger concurrently. The ledger is responsible for keeping that
//! safe. When the shutdown future resolves the listener is closed and open connections are given a
//! grace period to finish their in-flight requests.

mod error;
mod routes;

use crate::store::Ledger;
use crate::Result;
use anyhow::Context;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, debug_span, info, trace, warn, Instrument};
use uuid::Uuid;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// An HTTP server bound to a socket and serving a ledger.
pub struct Gateway {
    listener: TcpListener,
    ledger: Arc<dyn Ledger>,
}

impl Gateway {
    /// Binds to `addr`. Use port 0 to have the operating system pick a free port.
    pub async fn bind(addr: SocketAddr, ledger: Arc<dyn Ledger>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Unable to bind the HTTP server to {addr}"))?;
        Ok(Self { listener, ledger })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Unable to get the listening address")
    }

    /// Serves requests until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);
        info!("Listening on http://{}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!("Unable to accept a connection: {e}");
                            continue;
                        }
                    };
                    trace!("Accepted connection from {peer}");

                    let ledger = Arc::clone(&self.ledger);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let ledger = Arc::clone(&ledger);
                        let span = debug_span!(
                            "request",
                            id = %Uuid::new_v4(),
                            method = %req.method(),
                            path = %req.uri().path(),
                        );
                        async move {
                            let response = routes::handle(req, ledger.as_ref()).await;
                            debug!(status = response.status().as_u16(), "Handled request");
                            Ok::<_, Infallible>(response)
                        }
                        .instrument(span)
                    });

                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    let conn = graceful.watch(conn);
                    tokio::spawn(async move {
                        if let Err(e) = conn.await {
                            debug!("Connection from {peer} closed with an error: {e}");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutting down the HTTP server");
                    break;
                }
            }
        }

        drop(self.listener);
        tokio::select! {
            _ = graceful.shutdown() => debug!("All connections closed"),
            _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
                warn!("Timed out waiting for connections to close")
            }
        }
        Ok(())
    }
}
