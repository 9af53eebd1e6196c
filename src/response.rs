//! HTTP response type.
//!
//! A route that proxies never builds one of these: it returns whatever the
//! backend produced. Builders are here for backends, tests, and the server's
//! failure translation.

use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

use crate::body::Body;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types for bodies a backend stub or the server's failure path
/// builds itself. Proxied responses keep whatever the origin sent.
pub enum ContentType {
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    fn as_static(&self) -> &'static str {
        match self {
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }

    fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_static())
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An HTTP response coming back from a backend.
///
/// # Shortcuts
///
/// ```rust
/// use backroute::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::new(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use backroute::{ContentType, Response, StatusCode};
/// use backroute::header::{HeaderValue, LOCATION};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header(LOCATION, HeaderValue::from_static("/users/42"))
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::OctetStream, vec![0xca, 0xfe]);
/// ```
#[derive(Debug)]
pub struct Response {
    inner: http::Response<Body>,
}

impl Response {
    /// Response with `status` and no body.
    pub fn new(status: StatusCode) -> Self {
        Self::builder().status(status).no_body()
    }

    /// `200 OK`, `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Builder for responses that need a custom status, extra headers, or a
    /// streamed body. Defaults to `200 OK`.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn from_http(inner: http::Response<Body>) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> StatusCode { self.inner.status() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &Body { self.inner.body() }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_body(self) -> Body {
        self.inner.into_body()
    }

    pub fn into_http(self) -> http::Response<Body> {
        self.inner
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Terminated by a typed body method, so
/// the content type always matches the bytes.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a header. Repeated names keep every value, in insertion order.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(ContentType::Json, Body::from(body))
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text, Body::from(body.into()))
    }

    /// Terminate with a typed body, e.g. raw bytes as `application/octet-stream`.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type, Body::from(body))
    }

    /// Terminate with an arbitrary body, e.g. a chunk stream. No content type
    /// is added.
    pub fn body(self, body: Body) -> Response {
        let mut inner = http::Response::new(body);
        *inner.status_mut() = self.status;
        *inner.headers_mut() = self.headers;
        Response { inner }
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        self.body(Body::empty())
    }

    fn finish(mut self, content_type: ContentType, body: Body) -> Response {
        self.headers.insert(header::CONTENT_TYPE, content_type.header_value());
        self.body(body)
    }
}
