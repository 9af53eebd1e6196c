//! Minimal forwarding proxy: one listener, one origin.
//!
//! Run with:
//!   cargo run --example forward -- proxy.yaml
//!
//! proxy.yaml:
//!   listen: 127.0.0.1:8080
//!   backend:
//!     origin: http://127.0.0.1:3000
//!     request_timeout_ms: 10000
//!
//! Without a config file the demo forwards 127.0.0.1:8080 → 127.0.0.1:3000.
//!
//! Try:
//!   curl -i http://localhost:8080/anything?at=all

use std::sync::Arc;

use backroute::{BackendConfig, Config, HttpClient, Server, proxy_to_backend};

#[tokio::main]
async fn main() -> Result<(), backroute::Error> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config {
            listen: ([127, 0, 0, 1], 8080).into(),
            backend: BackendConfig::new("http://127.0.0.1:3000"),
        },
    };

    tracing::info!(origin = %config.backend.origin, "forwarding");

    let client = HttpClient::new(&config.backend)?;
    let route = proxy_to_backend(Arc::new(client));

    Server::bind(config.listen).serve(route).await
}
