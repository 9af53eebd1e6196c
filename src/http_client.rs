//! A [`BackendClient`] that speaks HTTP to a single origin.
//!
//! Connections are pooled by hyper-util's client; nothing here retries,
//! balances, or health-checks. Both bodies are streamed: the request body is
//! read from the caller as the origin consumes it, and the response body is
//! handed back as the origin's live stream.

use std::time::Duration;

use http::uri::{Authority, PathAndQuery, Scheme};
use http::{Uri, Version};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, trace};

use crate::body::Body;
use crate::client::{BackendClient, ResponseFuture};
use crate::config::BackendConfig;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Pooled HTTP/1.1 client bound to one origin.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, Body>,
    authority: Authority,
    request_timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        config.validate()?;
        let origin = config.origin_url()?;
        let host = origin
            .host_str()
            .ok_or_else(|| Error::Config(format!("backend origin `{}`: missing host", config.origin)))?;
        let port = origin.port_or_known_default().unwrap_or(80);
        let authority: Authority = format!("{host}:{port}")
            .parse()
            .map_err(|e| Error::Config(format!("backend origin `{}`: {e}", config.origin)))?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout()));
        connector.set_nodelay(true);

        let inner = Client::builder(TokioExecutor::new()).build(connector);

        debug!(%authority, timeout = ?config.request_timeout(), "http backend client ready");

        Ok(Self { inner, authority, request_timeout: config.request_timeout() })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Points `uri` at the origin, keeping its path and query.
    fn target_uri(&self, uri: &Uri) -> Result<Uri, Error> {
        let mut parts = uri.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Ok(Uri::from_parts(parts).map_err(http::Error::from)?)
    }
}

impl BackendClient for HttpClient {
    fn send_request(&self, request: Request) -> ResponseFuture {
        let client = self.inner.clone();
        let timeout = self.request_timeout;
        let target = self.target_uri(request.uri());

        Box::pin(async move {
            let mut outbound = request.into_http();
            *outbound.uri_mut() = target?;
            // The pooled connection is HTTP/1.1 whatever the caller spoke.
            *outbound.version_mut() = Version::HTTP_11;

            trace!(uri = %outbound.uri(), "sending to origin");

            let response = match tokio::time::timeout(timeout, client.request(outbound)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) if e.is_connect() => return Err(Error::Connect(e.into())),
                Ok(Err(e)) => return Err(Error::Protocol(e.into())),
                Err(_) => return Err(Error::Timeout(timeout)),
            };

            Ok(Response::from_http(response.map(Body::new)))
        })
    }
}
