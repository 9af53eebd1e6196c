//! Unified error type.

use std::time::Duration;

use thiserror::Error;

/// A boxed, thread-safe error used as the source of transport and body failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by backroute's fallible operations.
///
/// A [`Route`](crate::Route) never turns an `Error` into a response. Whatever
/// the [`BackendClient`](crate::BackendClient) fails with is exactly what the
/// caller of the route sees. Translating failures into `502`/`504` responses
/// is the job of the layer hosting the route (see [`Server`](crate::Server)).
#[derive(Debug, Error)]
pub enum Error {
    /// The backend could not be reached (refused, unreachable, DNS failure).
    #[error("backend connection failed: {0}")]
    Connect(#[source] BoxError),

    /// The backend did not produce a response in time.
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    /// The backend connection broke or spoke malformed HTTP.
    #[error("backend protocol error: {0}")]
    Protocol(#[source] BoxError),

    /// The request could not be built or addressed.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    /// Reading a body stream failed.
    #[error("body: {0}")]
    Body(#[source] BoxError),

    /// A failure defined by a custom [`BackendClient`](crate::BackendClient).
    #[error("backend: {0}")]
    Backend(#[source] BoxError),

    /// Configuration could not be parsed or validated.
    #[error("config: {0}")]
    Config(String),

    /// Binding or accepting on a socket failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a client-defined failure. The wrapped error stays reachable
    /// through [`std::error::Error::source`] and can be downcast.
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}
