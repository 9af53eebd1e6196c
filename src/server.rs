//! HTTP server and graceful shutdown.
//!
//! The server is the layer *above* a route. It owns the things a route
//! deliberately does not: turning sockets into [`Request`]s, creating a fresh
//! [`InterceptorContext`] per request, and deciding what the client sees when
//! a route fails. Failure translation lives here and nowhere else:
//!
//! | Route outcome | Client sees |
//! |---|---|
//! | `Ok(response)` | that response, byte for byte |
//! | `Err(Error::Timeout(_))` | `504 Gateway Timeout` |
//! | `Err(Error::InvalidRequest(_))` | `400 Bad Request` |
//! | any other `Err` | `502 Bad Gateway` |
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`, so no new connections are made.
//! 2. Closing idle keep-alive connections and letting every in-flight
//!    request run to completion.
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::body::Body;
use crate::context::InterceptorContext;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::route::Route;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use backroute::Server;
    /// let server = Server::bind(([0, 0, 0, 0], 8080).into());
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `route`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve<R: Route>(self, route: R) -> Result<(), Error> {
        self.serve_with_shutdown(route, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of waiting for SIGTERM / Ctrl-C.
    pub async fn serve_with_shutdown<R, S>(self, route: R, signal: S) -> Result<(), Error>
    where
        R: Route,
        S: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, route, signal).await
    }
}

/// Serves `route` on an already-bound listener until `signal` resolves, then
/// drains in-flight connections.
pub async fn serve_listener<R, S>(listener: TcpListener, route: R, signal: S) -> Result<(), Error>
where
    R: Route,
    S: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;

    // Shared by every connection task; the route itself is stateless.
    let route = Arc::new(route);

    info!(addr = %local_addr, "backroute listening");

    let mut tasks = tokio::task::JoinSet::new();

    // Flipped once on shutdown. Every connection task watches it and stops
    // taking new requests on its connection, finishing the one in flight.
    let (closing_tx, closing_rx) = watch::channel(false);

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Check shutdown first so a SIGTERM immediately stops accepting
            // new connections, even if more are queued.
            biased;

            () = &mut signal => {
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

                let route = Arc::clone(&route);
                let mut closing = closing_rx.clone();
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let route = Arc::clone(&route);
                        async move { dispatch(route, req, remote_addr).await }
                    });

                    // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                    let builder = ConnBuilder::new(TokioExecutor::new());
                    let conn = builder.serve_connection(io, svc);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        res = conn.as_mut() => res,
                        _ = closing.changed() => {
                            // Idle keep-alive connections close now; a busy
                            // one finishes its current request first.
                            conn.as_mut().graceful_shutdown();
                            conn.as_mut().await
                        }
                    };

                    if let Err(e) = result {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    let _ = closing_tx.send(true);
    while tasks.join_next().await.is_some() {}

    info!("backroute stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Hands one request to the route and produces one response.
///
/// Never returns `Err`: route failures are translated into responses here,
/// so hyper never sees an error.
async fn dispatch<R: Route>(
    route: Arc<R>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let request = Request::from_http(req.map(Body::new));
    let context = InterceptorContext::new().with_client_address(remote_addr);

    let response = match route.handle(request, context).await {
        Ok(response) => {
            debug!(%method, %path, status = response.status().as_u16(), "request handled");
            response
        }
        Err(e) => {
            warn!(%method, %path, peer = %remote_addr, error = %e, "route failed");
            failure_response(&e)
        }
    };

    Ok(response.into_http())
}

/// The response a client sees when a route fails with `err`.
pub(crate) fn failure_response(err: &Error) -> Response {
    let status = match err {
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    let reason = status.canonical_reason().unwrap_or("Error");
    Response::builder().status(status).text(format!("{} {reason}", status.as_u16()))
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. If a handler cannot be installed the
/// corresponding arm never fires rather than taking the server down.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // `pending()` never resolves, so the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
