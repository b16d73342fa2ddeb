//! HTTP listener and graceful shutdown.
//!
//! On shutdown the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Asks every open connection to close once its current request is
//!    answered; idle keep-alive connections close at once.
//! 3. Waits for them up to the drain timeout, then drops the rest.
//! 4. Returns from [`Server::serve`].
//!
//! [`Api::listen`](crate::Api::listen) runs two of these: one for API
//! traffic, one for the documentation.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// One TCP listener dispatching to one handler.
pub struct Server {
    bind: Bind,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { bind: Bind::Addr(addr), drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// Serves on an already-bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { bind: Bind::Listener(listener), drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// How long shutdown waits for in-flight requests before dropping the
    /// remaining connections. Defaults to 10 seconds.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Serves until SIGTERM or Ctrl-C, then drains in-flight connections.
    pub async fn serve(self, handler: BoxedHandler) -> Result<(), Error> {
        self.serve_with_shutdown(handler, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown(
        self,
        handler: BoxedHandler,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let local = listener.local_addr()?;
        info!(addr = %local, "listening");

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting immediately,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(addr = %local, in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let handler = BoxedHandler::clone(&handler);
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let handler = BoxedHandler::clone(&handler);
                        async move { dispatch(handler, req).await }
                    });
                    let conn = builder.serve_connection(TokioIo::new(stream), svc).into_owned();
                    let conn = graceful.watch(conn);

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            debug!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        // Idle keep-alive connections close right away; busy ones finish
        // their current request first.
        tokio::select! {
            () = graceful.shutdown() => {}
            () = tokio::time::sleep(self.drain_timeout) => {
                warn!(addr = %local, remaining = tasks.len(), "drain timed out, dropping connections");
            }
        }
        tasks.shutdown().await;

        info!(addr = %local, "stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads the body and hands the request to `handler`. Every failure is
/// answered with a response, so hyper never sees an error.
async fn dispatch(
    handler: BoxedHandler,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let response = match body.collect().await {
        Ok(collected) => handler.call(Request::new(parts, collected.to_bytes())).await,
        Err(e) => {
            debug!("failed to read request body: {e}");
            Response::status(StatusCode::BAD_REQUEST)
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C on Windows).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
