//! HTTP server and graceful shutdown.
//!
//! TLS is terminated in front of hush. The server accepts plain connections,
//! speaks whatever HTTP version the client negotiates, collects each body and
//! hands the request to the [`App`]. Bodies of `DNT: 1` requests are not read.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::app::App;
use crate::error::{Error, HttpError};
use crate::handler::{BoxedHandler, ErasedHandler};
use crate::middleware::opted_out;
use crate::request::Request;
use crate::response::IntoResponse;

/// The HTTP server.
pub struct Server {
    socket: Socket,
}

enum Socket {
    Addr(SocketAddr),
    Bound(TcpListener),
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use hush::Server;
    /// let server = Server::bind("0.0.0.0:8080").unwrap();
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let parsed = addr.parse::<SocketAddr>()
            .map_err(|source| Error::Addr { addr: addr.to_owned(), source })?;
        Ok(Self { socket: Socket::Addr(parsed) })
    }

    /// Serves on an already bound listener, e.g. one on port 0.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { socket: Socket::Bound(listener) }
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown on SIGTERM or Ctrl-C.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of on process signals.
    pub async fn serve_with_shutdown(
        self,
        app: App,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.socket {
            Socket::Addr(addr) => TcpListener::bind(addr).await?,
            Socket::Bound(listener) => listener,
        };
        let addr = listener.local_addr()?;
        let endpoint = app.endpoint();

        info!(%addr, layers = ?app.layers(), "hush listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = signal;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
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

                    let endpoint = endpoint.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| dispatch(endpoint.clone(), req));

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("hush stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body and runs one request through the app.
///
/// An opted-out request is never read: its body is discarded and the chain
/// answers it from the headers alone. Every failure is already a response by
/// the time it gets here, so hyper never sees an error.
async fn dispatch(
    endpoint: BoxedHandler,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (head, body) = req.into_parts();

    if opted_out(&head.headers) {
        let response = endpoint.call(Request::from_parts(head, Bytes::new()), ()).await;
        return Ok(response.into_inner());
    }

    let response = match body.collect().await {
        Ok(collected) => endpoint.call(Request::from_parts(head, collected.to_bytes()), ()).await,
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            HttpError::BadRequest("could not read request body".to_owned()).into_response()
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT. Only Ctrl-C on non-Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
