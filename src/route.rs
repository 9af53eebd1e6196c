//! Routes, and the route that proxies to a backend.
//!
//! # What a proxy route does
//!
//! ```text
//! route.handle(req, ctx)
//!        ↓
//! client.send_request(req)              ← one call, made before returning
//!        ↓
//! ResponseFuture (backend's outcome)    ← returned as the route's outcome
//! ```
//!
//! Nothing in between: no buffering, no retry, no fallback response. A 500
//! from the backend is a 500 to the caller. A timeout from the backend is
//! `Err(Error::Timeout)` to the caller, never a synthetic 504. Dropping the
//! route's future drops the backend's future, which is how cancellation
//! reaches the client.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::client::{BackendClient, ResponseFuture};
use crate::context::InterceptorContext;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Something that can answer a request.
///
/// `Send + Sync + 'static` because a single route serves every connection
/// the server accepts, concurrently.
pub trait Route: Send + Sync + 'static {
    /// Starts handling `request`. The returned future carries its single
    /// terminal outcome.
    fn handle(&self, request: Request, context: InterceptorContext) -> ResponseFuture;
}

impl<R: Route + ?Sized> Route for Arc<R> {
    fn handle(&self, request: Request, context: InterceptorContext) -> ResponseFuture {
        (**self).handle(request, context)
    }
}

impl<R: Route + ?Sized> Route for Box<R> {
    fn handle(&self, request: Request, context: InterceptorContext) -> ResponseFuture {
        (**self).handle(request, context)
    }
}

// ── ProxyToBackendRoute ───────────────────────────────────────────────────────

/// Forwards every request to one backend client and returns its outcome
/// untouched.
///
/// ```rust
/// use std::sync::Arc;
/// use backroute::{client_fn, proxy_to_backend, Request, Response, StatusCode};
///
/// let client = Arc::new(client_fn(|_req: Request| async {
///     Ok(Response::new(StatusCode::OK))
/// }));
/// let route = proxy_to_backend(client);
/// ```
#[derive(Clone)]
pub struct ProxyToBackendRoute {
    client: Arc<dyn BackendClient>,
}

/// Shorthand for [`ProxyToBackendRoute::new`].
pub fn proxy_to_backend<C: BackendClient>(client: Arc<C>) -> ProxyToBackendRoute {
    ProxyToBackendRoute::new(client)
}

impl ProxyToBackendRoute {
    /// The route shares `client` with whoever else holds it; it never closes
    /// or reconfigures it.
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }
}

impl Route for ProxyToBackendRoute {
    fn handle(&self, request: Request, _context: InterceptorContext) -> ResponseFuture {
        let method = request.method().clone();
        let path = request.path().to_owned();
        debug!(%method, %path, "forwarding to backend");

        let outcome = self.client.send_request(request);

        Box::pin(async move {
            let outcome = outcome.await;
            match &outcome {
                Ok(res) => debug!(%method, %path, status = res.status().as_u16(), "backend responded"),
                Err(e) => debug!(%method, %path, error = %e, "backend failed"),
            }
            outcome
        })
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

/// Builds a [`Route`] from an async closure.
///
/// ```rust
/// use backroute::{route_fn, InterceptorContext, Request, Response};
///
/// let hello = route_fn(|_req: Request, _ctx: InterceptorContext| async {
///     Ok(Response::text("hello"))
/// });
/// ```
pub fn route_fn<F, Fut>(f: F) -> RouteFn<F>
where
    F: Fn(Request, InterceptorContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    RouteFn(f)
}

/// Newtype returned by [`route_fn`], bridging a closure to the trait.
#[derive(Clone)]
pub struct RouteFn<F>(F);

impl<F, Fut> Route for RouteFn<F>
where
    F: Fn(Request, InterceptorContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn handle(&self, request: Request, context: InterceptorContext) -> ResponseFuture {
        Box::pin((self.0)(request, context))
    }
}
