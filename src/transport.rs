//! The network capability the client consumes.
//!
//! [`Transport`] covers the three things the handshake needs from the outside
//! world: resolving the server host, plain HTTP GETs and dialing the
//! WebSocket stream. [`DefaultTransport`] backs it with `tokio`, `reqwest`
//! and `tokio-tungstenite`.

use async_trait::async_trait;
use futures::Sink;
use futures::stream::BoxStream;
use std::pin::Pin;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::infrastructure::HttpClient;
use crate::types::{Result, TransportError};
use crate::websocket::WebSocketFactory;

/// Write half of a live stream
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = TransportError> + Send>>;

/// Read half of a live stream
pub type FrameStream = BoxStream<'static, std::result::Result<Message, TransportError>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves `authority` (`host:port`), failing when no address is found.
    async fn resolve(&self, authority: &str) -> std::io::Result<()> {
        let mut addrs = tokio::net::lookup_host(authority).await?;
        if addrs.next().is_none() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no addresses for {}", authority),
            ));
        }
        Ok(())
    }

    /// GET `url`, returning the body of a successful response.
    async fn get(&self, url: &Url) -> std::result::Result<String, TransportError>;

    /// Opens the stream at `url` with the given `Origin` header.
    async fn dial(
        &self,
        url: &Url,
        origin: &str,
    ) -> std::result::Result<(FrameSink, FrameStream), TransportError>;
}

/// `reqwest` for HTTP, `tokio-tungstenite` for the stream.
pub struct DefaultTransport {
    http: HttpClient,
}

impl DefaultTransport {
    pub fn new(http_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(http_timeout)?,
        })
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn get(&self, url: &Url) -> std::result::Result<String, TransportError> {
        self.http.get_text(url).await
    }

    async fn dial(
        &self,
        url: &Url,
        origin: &str,
    ) -> std::result::Result<(FrameSink, FrameStream), TransportError> {
        WebSocketFactory::create(url, origin).await
    }
}
