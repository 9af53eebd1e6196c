//! Inbound HTTP request type.

use http::{HeaderMap, Method, Uri, Version};

use crate::body::Body;
use crate::error::Error;

/// An HTTP request on its way to a backend.
///
/// Owned by exactly one request/response cycle. Nothing about it is shared
/// between concurrent requests, and a route hands it to the backend client
/// as-is.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Body>,
}

impl Request {
    /// Builder preset to `GET uri`.
    ///
    /// ```rust
    /// let req = backroute::Request::get("/foo").build().unwrap();
    /// assert_eq!(req.path(), "/foo");
    /// ```
    pub fn get(uri: &str) -> RequestBuilder {
        Self::builder().method(Method::GET).uri(uri)
    }

    /// Builder preset to `POST uri`.
    pub fn post(uri: &str) -> RequestBuilder {
        Self::builder().method(Method::POST).uri(uri)
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder { inner: http::Request::builder() }
    }

    pub fn from_http(inner: http::Request<Body>) -> Self {
        Self { inner }
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn query(&self) -> Option<&str> { self.inner.uri().query() }
    pub fn version(&self) -> Version { self.inner.version() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &Body { self.inner.body() }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_body(self) -> Body {
        self.inner.into_body()
    }

    pub fn into_http(self) -> http::Request<Body> {
        self.inner
    }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Request`].
///
/// Invalid methods, URIs or headers are remembered and reported once, by the
/// terminal [`build`](RequestBuilder::build) / [`body`](RequestBuilder::body)
/// call, as [`Error::InvalidRequest`].
pub struct RequestBuilder {
    inner: http::request::Builder,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.inner = self.inner.method(method);
        self
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.inner = self.inner.uri(uri);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.inner = self.inner.version(version);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Terminate with an empty body.
    pub fn build(self) -> Result<Request, Error> {
        self.body(Body::empty())
    }

    /// Terminate with the given body (buffer or stream).
    pub fn body(self, body: impl Into<Body>) -> Result<Request, Error> {
        let inner = self.inner.body(body.into())?;
        Ok(Request { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_method_path_and_headers() {
        let req = Request::post("/users?active=true")
            .header("X-Trace", "abc")
            .body("{}")
            .unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query(), Some("active=true"));
        assert_eq!(req.header("x-trace"), Some("abc"));
    }

    #[test]
    fn malformed_uri_is_invalid_request() {
        let err = Request::get("/bad uri").build().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn malformed_header_is_invalid_request() {
        let err = Request::get("/").header("bad header", "x").build().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
