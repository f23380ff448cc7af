use super::builder::ClientConfig;
use super::negotiator::Negotiator;
use crate::endpoint::HandshakeParams;
use crate::transport::{FrameSink, FrameStream, Transport};
use crate::types::{
    KEEPALIVE_FRAME_LEN, NegotiationResult, Result, SignalRError, TRANSPORT_WEBSOCKETS,
    TransportError, payloads,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::Message;

/// One live streaming connection and its receive task.
///
/// Owned by the lifecycle controller and never reused: a broken handle is
/// torn down and replaced by a freshly opened one.
pub struct ConnectionHandle {
    negotiation: NegotiationResult,
    sink: FrameSink,
    closed: watch::Receiver<bool>,
    receive_task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// The negotiate response this connection was opened with
    pub fn negotiation(&self) -> &NegotiationResult {
        &self.negotiation
    }

    /// Whether the receive task has observed the end of the stream
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Writes a text frame
    pub async fn send(&mut self, text: &str) -> std::result::Result<(), TransportError> {
        self.sink.send(Message::text(text.to_string())).await
    }

    /// Writes the keepalive payload, giving up after `within`
    pub async fn heartbeat(&mut self, within: Duration) -> Result<()> {
        match time::timeout(within, self.send(payloads::HEARTBEAT)).await {
            Ok(sent) => sent.map_err(SignalRError::HeartbeatWriteFailed),
            Err(_) => Err(SignalRError::HeartbeatWriteFailed(TransportError::Other(
                "heartbeat write timed out".to_string(),
            ))),
        }
    }

    /// Resolves once the receive task has stopped
    pub async fn closed(&mut self) {
        // An Err means the task is gone without reporting, which is closed too
        let _ = self.closed.wait_for(|closed| *closed).await;
    }

    /// Sends the `close` request, waits up to `grace` for the server to end
    /// the stream, then closes the transport.
    ///
    /// The whole handshake is bounded by `grace`. A failed close write is
    /// returned as [`SignalRError::CloseWriteFailed`] after teardown.
    pub async fn close(mut self, grace: Duration) -> Result<()> {
        let deadline = Instant::now() + grace;

        let written = match time::timeout_at(deadline, self.send(payloads::CLOSE)).await {
            Ok(sent) => sent.map_err(SignalRError::CloseWriteFailed),
            Err(_) => Err(SignalRError::CloseWriteFailed(TransportError::Other(
                "close write timed out".to_string(),
            ))),
        };

        if written.is_ok() {
            match time::timeout_at(deadline, self.closed()).await {
                Ok(()) => tracing::debug!("Server acknowledged close"),
                Err(_) => tracing::debug!("No close acknowledgement within {:?}", grace),
            }
        }

        self.shutdown_transport(deadline).await;
        written
    }

    /// Closes the transport without the close handshake
    pub async fn teardown(mut self, grace: Duration) {
        self.shutdown_transport(Instant::now() + grace).await;
    }

    async fn shutdown_transport(&mut self, deadline: Instant) {
        match time::timeout_at(deadline, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Transport close failed: {}", e),
            Err(_) => tracing::debug!("Transport close timed out"),
        }
        self.receive_task.abort();
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.receive_task.abort();
    }
}

/// Runs the negotiate → start → connect sequence.
pub struct ConnectionManager {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    negotiator: Negotiator,
    inbound: Option<mpsc::Sender<String>>,
}

impl ConnectionManager {
    pub fn new(config: Arc<ClientConfig>, transport: Arc<dyn Transport>) -> Self {
        Self {
            negotiator: Negotiator::new(Arc::clone(&transport)),
            config,
            transport,
            inbound: None,
        }
    }

    /// Forward received payloads to `tx`
    pub fn with_inbound(mut self, tx: mpsc::Sender<String>) -> Self {
        self.inbound = Some(tx);
        self
    }

    pub async fn negotiate(&self) -> Result<NegotiationResult> {
        self.negotiator.negotiate(self.config.endpoints()).await
    }

    /// Start and dial with an already negotiated token
    pub async fn connect(&self, negotiation: NegotiationResult) -> Result<ConnectionHandle> {
        let endpoints = self.config.endpoints();
        let params = HandshakeParams {
            protocol_version: negotiation.protocol_version.clone(),
            transport: TRANSPORT_WEBSOCKETS.to_string(),
            connection_token: negotiation.connection_token.clone(),
            connection_data: self.config.connection_data().to_string(),
        };

        self.transport
            .get(&endpoints.start(&params))
            .await
            .map_err(SignalRError::StartFailed)?;
        tracing::debug!("Start acknowledged for connection {}", negotiation.connection_id);

        let (sink, stream) = self
            .transport
            .dial(&endpoints.connect(&params), &endpoints.origin())
            .await
            .map_err(SignalRError::StreamDialFailed)?;
        tracing::info!("Connected to {}", self.config.address());

        let (closed_tx, closed_rx) = watch::channel(false);
        let receive_task = spawn_receiver(stream, closed_tx, self.inbound.clone());

        Ok(ConnectionHandle {
            negotiation,
            sink,
            closed: closed_rx,
            receive_task,
        })
    }

    /// Negotiate, start and connect, strictly in that order
    pub async fn open(&self) -> Result<ConnectionHandle> {
        let negotiation = self.negotiate().await?;
        self.connect(negotiation).await
    }
}

fn spawn_receiver(
    mut stream: FrameStream,
    closed_tx: watch::Sender<bool>,
    mut inbound: Option<mpsc::Sender<String>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Starting receive task");
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if text.len() <= KEEPALIVE_FRAME_LEN {
                        continue;
                    }
                    tracing::info!("Received: {}", text.as_str());
                    forward(&mut inbound, text.as_str().to_string()).await;
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                }
                Ok(Message::Close(frame)) => {
                    match frame {
                        Some(close_frame) => tracing::info!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        ),
                        None => tracing::info!("Server closed connection without close frame"),
                    }
                    break;
                }
                Ok(Message::Ping(data)) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Ok(Message::Pong(data)) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Ok(Message::Frame(_)) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Err(e) => {
                    tracing::error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }
        closed_tx.send_replace(true);
        tracing::debug!("Receive task finished");
    })
}

async fn forward(inbound: &mut Option<mpsc::Sender<String>>, payload: String) {
    let Some(tx) = inbound.as_ref() else {
        return;
    };
    if tx.send(payload).await.is_err() {
        tracing::debug!("Inbound receiver dropped, no longer forwarding payloads");
        *inbound = None;
    }
}
