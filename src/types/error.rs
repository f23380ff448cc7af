use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Underlying cause of a failed handshake step or stream write.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request error (DNS, refused connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket protocol error (handshake, invalid frame, broken pipe)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The server answered with a non-success status code
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Response body did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response decoded but is unusable (e.g. empty connection token)
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The stream is already closed
    #[error("Connection closed")]
    Closed,

    /// Any other transport failure with a descriptive message
    #[error("{0}")]
    Other(String),
}

/// Errors that can occur when running the SignalR client.
#[derive(Error, Debug)]
pub enum SignalRError {
    /// The server address cannot be resolved; retrying will not help
    #[error("Host unresolvable: {host}: {source}")]
    HostUnresolvable {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Negotiate request failed or returned an unusable body
    #[error("Negotiation failed: {0}")]
    NegotiationFailed(#[source] TransportError),

    /// Start request failed or returned a non-success status
    #[error("Start failed: {0}")]
    StartFailed(#[source] TransportError),

    /// WebSocket handshake to the connect endpoint failed
    #[error("Stream dial failed: {0}")]
    StreamDialFailed(#[source] TransportError),

    /// Heartbeat could not be written to the live connection
    #[error("Heartbeat write failed: {0}")]
    HeartbeatWriteFailed(#[source] TransportError),

    /// Close frame could not be written (best effort)
    #[error("Close write failed: {0}")]
    CloseWriteFailed(#[source] TransportError),

    /// Invalid client options
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error (malformed address)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SignalRError {
    /// Returns `true` for errors that must stop the client instead of
    /// triggering a reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SignalRError::HostUnresolvable { .. })
    }
}

/// Convenience type alias for `Result<T, SignalRError>`.
pub type Result<T> = std::result::Result<T, SignalRError>;
