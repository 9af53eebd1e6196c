//! The backend client contract.
//!
//! A [`BackendClient`] turns one [`Request`] into one eventual outcome: a
//! [`Response`] or an [`Error`]. How it gets there (connection pools, TLS,
//! retries, picking an origin) is its own business. Routes only rely on the
//! contract below.
//!
//! # The outcome future
//!
//! ```text
//! client.send_request(req)        ← synchronous call, returns immediately
//!        ↓
//! ResponseFuture                  ← Pin<Box<dyn Future + Send>>
//!        ↓  .await
//! Ok(Response) | Err(Error)       ← exactly one, exactly once
//! ```
//!
//! A future completes at most once by construction, so "exactly one terminal
//! event" is the type system's job, not ours. Dropping the future before it
//! completes cancels the call: everything the client captured for it is
//! dropped with it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future resolving to a request's single
/// terminal outcome.
///
/// `Send + 'static` so the runtime can poll it on any worker thread and the
/// caller can hand it to [`tokio::spawn`].
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

/// Performs the network call to an origin for one request.
///
/// One client instance is shared by every request a route handles, possibly
/// on many threads at once, hence `Send + Sync`. Implementations must not
/// assume calls are serialized.
pub trait BackendClient: Send + Sync + 'static {
    /// Starts sending `request`. The returned future carries its outcome.
    fn send_request(&self, request: Request) -> ResponseFuture;
}

impl<C: BackendClient + ?Sized> BackendClient for Arc<C> {
    fn send_request(&self, request: Request) -> ResponseFuture {
        (**self).send_request(request)
    }
}

impl<C: BackendClient + ?Sized> BackendClient for Box<C> {
    fn send_request(&self, request: Request) -> ResponseFuture {
        (**self).send_request(request)
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

/// Builds a [`BackendClient`] from an async closure.
///
/// Handy for stubs and tests:
///
/// ```rust
/// use backroute::{client_fn, Request, Response, StatusCode};
///
/// let client = client_fn(|_req: Request| async {
///     Ok(Response::new(StatusCode::OK))
/// });
/// ```
pub fn client_fn<F, Fut>(f: F) -> ClientFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    ClientFn(f)
}

/// Newtype returned by [`client_fn`], bridging a closure to the trait.
#[derive(Clone)]
pub struct ClientFn<F>(F);

impl<F, Fut> BackendClient for ClientFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn send_request(&self, request: Request) -> ResponseFuture {
        Box::pin((self.0)(request))
    }
}
