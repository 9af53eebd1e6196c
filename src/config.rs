//! YAML configuration.
//!
//! ```yaml
//! listen: 0.0.0.0:8080
//! backend:
//!   origin: http://10.0.0.7:3000
//!   connect_timeout_ms: 2000
//!   request_timeout_ms: 15000
//! ```
//!
//! Only `backend.origin` is required.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::Error;

/// Top-level configuration for a proxy process.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    pub backend: BackendConfig,
}

/// Where and how to reach the single backend origin.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the origin, e.g. `http://127.0.0.1:3000`. Only the scheme,
    /// host and port are used; request paths are kept as they arrive.
    pub origin: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_connect_timeout_ms() -> u64 { 5_000 }
fn default_request_timeout_ms() -> u64 { 30_000 }

impl Config {
    /// Reads and validates a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.backend.validate()?;
        Ok(config)
    }
}

impl BackendConfig {
    /// Config for `origin` with default timeouts.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Checks the origin and that both timeouts are non-zero.
    pub fn validate(&self) -> Result<(), Error> {
        self.origin_url()?;
        if self.connect_timeout_ms == 0 {
            return Err(Error::Config("backend connect_timeout_ms must be greater than 0".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("backend request_timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }

    /// Parses the origin, rejecting anything that is not a plain `http` URL
    /// with a host.
    pub fn origin_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&self.origin)
            .map_err(|e| Error::Config(format!("backend origin `{}`: {e}", self.origin)))?;
        if url.scheme() != "http" {
            return Err(Error::Config(format!(
                "backend origin `{}`: unsupported scheme `{}`",
                self.origin,
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::Config(format!("backend origin `{}`: missing host", self.origin)));
        }
        Ok(url)
    }
}
