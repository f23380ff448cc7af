//! In-memory [`Transport`] that records every call.

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::transport::{FrameSink, FrameStream, Transport};
use crate::types::TransportError;

pub(crate) const NEGOTIATE_BODY: &str = r#"{"Url":"/signalr","ConnectionToken":"abc","ConnectionId":"c-1","ProtocolVersion":"1.5","TryWebSockets":true,"KeepAliveTimeout":20.0}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Resolve,
    Negotiate,
    Start,
    Dial,
}

/// Server side of one dialed stream.
pub(crate) struct ServerEnd {
    /// Frames the client wrote
    pub received: mpsc::UnboundedReceiver<Message>,
    /// Frames delivered to the client; dropping it ends the client's stream
    pub push: mpsc::UnboundedSender<Message>,
}

impl ServerEnd {
    /// Text frames the client has written so far.
    pub fn drain_text(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(message) = self.received.try_recv() {
            if let Message::Text(text) = message {
                frames.push(text.as_str().to_string());
            }
        }
        frames
    }
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    unresolvable: bool,
    negotiate_body: Option<String>,
    negotiate_failures: AtomicUsize,
    start_failures: AtomicUsize,
    dial_failures: AtomicUsize,
    broken_sinks: AtomicUsize,
    stalled_sinks: AtomicUsize,
    transient_resolve_failures: AtomicUsize,
    calls: Mutex<Vec<(Call, Instant)>>,
    dialed: Mutex<Vec<(Url, String)>>,
    started: Mutex<Vec<Url>>,
    servers: Mutex<Vec<Option<ServerEnd>>>,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unresolvable(mut self) -> Self {
        self.unresolvable = true;
        self
    }

    pub fn negotiate_body(mut self, body: &str) -> Self {
        self.negotiate_body = Some(body.to_string());
        self
    }

    pub fn failing_negotiations(self, count: usize) -> Self {
        self.negotiate_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn failing_starts(self, count: usize) -> Self {
        self.start_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn failing_dials(self, count: usize) -> Self {
        self.dial_failures.store(count, Ordering::SeqCst);
        self
    }

    /// The first `count` dialed streams reject every write.
    pub fn broken_sinks(self, count: usize) -> Self {
        self.broken_sinks.store(count, Ordering::SeqCst);
        self
    }

    /// The first `count` dialed streams accept no writes and never fail them,
    /// like a peer that stopped reading.
    pub fn stalled_sinks(self, count: usize) -> Self {
        self.stalled_sinks.store(count, Ordering::SeqCst);
        self
    }

    /// The first `count` resolutions fail the way a resolver without network
    /// does.
    pub fn transient_resolve_failures(self, count: usize) -> Self {
        self.transient_resolve_failures.store(count, Ordering::SeqCst);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    /// When each `call` happened, relative to `since`.
    pub fn times(&self, call: Call, since: Instant) -> Vec<std::time::Duration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == call)
            .map(|(_, at)| at.duration_since(since))
            .collect()
    }

    pub fn dialed(&self) -> Vec<(Url, String)> {
        self.dialed.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<Url> {
        self.started.lock().unwrap().clone()
    }

    /// Takes the server end of the `index`-th dialed stream.
    pub fn take_server(&self, index: usize) -> ServerEnd {
        self.servers.lock().unwrap()[index]
            .take()
            .expect("server end already taken")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn resolve(&self, authority: &str) -> std::io::Result<()> {
        self.record(Call::Resolve);
        if self.unresolvable {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such host: {}", authority),
            ));
        }
        if take_one(&self.transient_resolve_failures) {
            return Err(std::io::Error::other(
                "failed to lookup address information: Temporary failure in name resolution",
            ));
        }
        Ok(())
    }

    async fn get(&self, url: &Url) -> Result<String, TransportError> {
        if url.path().ends_with("/negotiate") {
            self.record(Call::Negotiate);
            if take_one(&self.negotiate_failures) {
                return Err(TransportError::Other("connection refused".to_string()));
            }
            return Ok(self
                .negotiate_body
                .clone()
                .unwrap_or_else(|| NEGOTIATE_BODY.to_string()));
        }

        self.record(Call::Start);
        self.started.lock().unwrap().push(url.clone());
        if take_one(&self.start_failures) {
            return Err(TransportError::Status(500));
        }
        Ok(r#"{"Response":"started"}"#.to_string())
    }

    async fn dial(&self, url: &Url, origin: &str) -> Result<(FrameSink, FrameStream), TransportError> {
        self.record(Call::Dial);
        self.dialed
            .lock()
            .unwrap()
            .push((url.clone(), origin.to_string()));
        if take_one(&self.dial_failures) {
            return Err(TransportError::Other("handshake rejected".to_string()));
        }

        let (client_tx, mut server_rx) = mpsc::unbounded::<Message>();
        let (server_tx, client_rx) = mpsc::unbounded::<Message>();
        if take_one(&self.broken_sinks) {
            server_rx.close();
        }

        let sink: FrameSink = if take_one(&self.stalled_sinks) {
            Box::pin(futures::sink::unfold((), |(), _: Message| {
                futures::future::pending::<Result<(), TransportError>>()
            }))
        } else {
            Box::pin(client_tx.sink_map_err(|e| TransportError::Other(e.to_string())))
        };
        let stream: FrameStream = client_rx.map(Ok).boxed();

        self.servers.lock().unwrap().push(Some(ServerEnd {
            received: server_rx,
            push: server_tx,
        }));

        Ok((sink, stream))
    }
}
