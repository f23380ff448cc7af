use crate::transport::{FrameSink, FrameStream};
use crate::types::TransportError;
use futures::{SinkExt, StreamExt, TryStreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use url::Url;

/// WebSocket factory for creating WebSocket connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Performs the WebSocket handshake with the given `Origin` header and
    /// splits the stream into its write and read halves
    pub async fn create(
        url: &Url,
        origin: &str,
    ) -> Result<(FrameSink, FrameStream), TransportError> {
        tracing::debug!("Creating WebSocket connection to: {}", url.path());

        let mut request = url.as_str().into_client_request()?;
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| TransportError::Other(format!("invalid origin '{}': {}", origin, e)))?;
        request.headers_mut().insert(ORIGIN, origin);

        let (ws_stream, response) = connect_async(request).await?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());

        let (write_half, read_half) = ws_stream.split();
        let sink: FrameSink = Box::pin(write_half.sink_map_err(TransportError::from));
        let stream: FrameStream = read_half.map_err(TransportError::from).boxed();

        Ok((sink, stream))
    }
}
