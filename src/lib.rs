//! # backroute
//!
//! Transparent proxy routes for Rust services.
//! One request in, one backend call, one outcome out.
//!
//! ## The contract
//!
//! A [`ProxyToBackendRoute`] takes a [`Request`] and its
//! [`InterceptorContext`], makes exactly one call to a shared
//! [`BackendClient`], and returns that call's future as its own:
//!
//! - **Pass-through**: status, headers and body stream arrive untouched.
//! - **Exactly once**: the future resolves to one `Ok(Response)` or one
//!   `Err(Error)`, never both, never neither.
//! - **Transparent failures**: a backend timeout is an `Err` carrying that
//!   timeout, not a made-up `504`. Translating errors into responses belongs
//!   to whoever hosts the route ([`Server`] does it).
//! - **Cancellation**: drop the future and the backend call is dropped with it.
//!
//! What backroute leaves to the backend client: connection pooling, load
//! balancing, retries, TLS. [`HttpClient`] is a plain single-origin client
//! for when that is all you need.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use backroute::{proxy_to_backend, BackendConfig, HttpClient, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), backroute::Error> {
//!     let client = HttpClient::new(&BackendConfig::new("http://127.0.0.1:3000"))?;
//!     let route = proxy_to_backend(Arc::new(client));
//!
//!     Server::bind(([0, 0, 0, 0], 8080).into()).serve(route).await
//! }
//! ```

mod body;
mod client;
mod config;
mod context;
mod error;
mod http_client;
mod request;
mod response;
mod route;
mod server;

pub use body::Body;
pub use client::{BackendClient, ClientFn, ResponseFuture, client_fn};
pub use config::{BackendConfig, Config};
pub use context::InterceptorContext;
pub use error::{BoxError, Error};
pub use http_client::HttpClient;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, Response, ResponseBuilder};
pub use route::{ProxyToBackendRoute, Route, RouteFn, proxy_to_backend, route_fn};
pub use server::{Server, serve_listener};

pub use http::{HeaderMap, Method, StatusCode, Version, header};
