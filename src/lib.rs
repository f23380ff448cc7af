//! # SignalR Client
//!
//! A reconnecting Rust client for the SignalR WebSocket transport.
//!
//! The client negotiates a connection token over HTTP, calls the start
//! endpoint, opens the WebSocket stream for one hub, sends a heartbeat every
//! ten seconds and reconnects whenever the connection breaks.
//!
//! ## Example
//!
//! ```no_run
//! use signalr_client_rs::{SignalRClient, SignalRClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SignalRClient::new(
//!         "example.com",
//!         "chat",
//!         SignalRClientOptions {
//!             scheme: "https".to_string(),
//!             ..Default::default()
//!         },
//!     )?;
//!
//!     client
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod endpoint;
pub mod infrastructure;
pub mod transport;
pub mod types;
pub mod websocket;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{
    ClientConfig, ConnectionHandle, ConnectionManager, ConnectionState, SignalRClient,
    SignalRClientBuilder, SignalRClientOptions,
};
pub use endpoint::{EndpointKind, EndpointSpec, Endpoints, HandshakeParams};
pub use transport::{DefaultTransport, Transport};
pub use types::{NegotiationResult, SignalRError, TransportError};
