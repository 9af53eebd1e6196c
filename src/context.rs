//! Per-request interceptor context.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

/// State that travels with one request through the handling path.
///
/// Created fresh for every inbound request and dropped when its
/// request/response cycle ends. Interceptors use the string-keyed attribute
/// map to hand values to each other. A
/// [`ProxyToBackendRoute`](crate::ProxyToBackendRoute) carries it along
/// without reading or writing it.
#[derive(Default)]
pub struct InterceptorContext {
    client_address: Option<SocketAddr>,
    attributes: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl InterceptorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_address(mut self, addr: SocketAddr) -> Self {
        self.client_address = Some(addr);
        self
    }

    pub fn client_address(&self) -> Option<SocketAddr> {
        self.client_address
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn add<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.attributes.insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key)?.downcast_ref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Removes and returns the value under `key` if it is of type `T`.
    /// A value of another type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.attributes.get(key)?.is::<T>() {
            return None;
        }
        let boxed = self.attributes.remove(key)?;
        boxed.downcast().ok().map(|b: Box<T>| *b)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for InterceptorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorContext")
            .field("client_address", &self.client_address)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}
