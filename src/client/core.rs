use super::{
    ClientConfig, ConnectionHandle, ConnectionManager, ConnectionState, SignalRClientBuilder,
    SignalRClientOptions, StateTracker,
};
use crate::infrastructure::{Keepalive, Timer};
use crate::types::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;

/// The main entry point: a self-healing connection to one SignalR hub.
///
/// `SignalRClient` negotiates, opens the WebSocket stream, sends a heartbeat
/// on a fixed interval and reconnects whenever the connection breaks. It keeps
/// retrying until it is told to shut down or the server address turns out to
/// be unresolvable.
///
/// # Example
///
/// ```no_run
/// use signalr_client_rs::{SignalRClient, SignalRClientOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SignalRClient::new(
///     "example.com",
///     "chat",
///     SignalRClientOptions::default(),
/// )?;
///
/// client
///     .run(async {
///         let _ = tokio::signal::ctrl_c().await;
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SignalRClient {
    pub(crate) config: Arc<ClientConfig>,

    // Opens handles; the controller owns the one that is live
    pub(crate) connection: ConnectionManager,

    pub(crate) state: StateTracker,
}

impl SignalRClient {
    /// Creates a client using the default `reqwest` / `tokio-tungstenite`
    /// transport.
    ///
    /// Nothing touches the network until [`run()`](Self::run) is called.
    ///
    /// # Arguments
    ///
    /// * `address` - Server host with optional port (e.g. `example.com:8443`)
    /// * `hub_name` - Hub to subscribe to
    /// * `options` - Scheme and timing overrides
    ///
    /// # Errors
    ///
    /// Returns [`SignalRError::Config`](crate::types::SignalRError::Config) if the
    /// address or hub name is empty, the scheme is not `http`/`https`, or a
    /// timing option is invalid.
    pub fn new(
        address: impl Into<String>,
        hub_name: impl Into<String>,
        options: SignalRClientOptions,
    ) -> Result<Self> {
        SignalRClientBuilder::new(address, hub_name, options)?.build()
    }

    /// Starts a builder for custom transports or inbound forwarding.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use signalr_client_rs::{SignalRClient, SignalRClientOptions};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    /// let client = SignalRClient::builder("example.com", "chat", SignalRClientOptions::default())?
    ///     .inbound(tx)
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder(
        address: impl Into<String>,
        hub_name: impl Into<String>,
        options: SignalRClientOptions,
    ) -> Result<SignalRClientBuilder> {
        SignalRClientBuilder::new(address, hub_name, options)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Watch lifecycle transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Connects and keeps the connection alive until `shutdown` completes.
    ///
    /// The lifecycle is:
    /// - open (negotiate, start, connect); on failure wait one reconnect
    ///   interval and try again, indefinitely
    /// - while connected, send a heartbeat every keepalive interval; a failed
    ///   write or a stream closed by the server tears the connection down and
    ///   reopens it immediately
    /// - when `shutdown` completes, send the close request and give the server
    ///   one grace period to acknowledge it
    ///
    /// # Errors
    ///
    /// Returns [`SignalRError::HostUnresolvable`](crate::types::SignalRError::HostUnresolvable)
    /// when the server address cannot be resolved. Every other failure is
    /// logged and retried. Returns `Ok(())` after a shutdown.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            "Starting SignalR connection to {} (hub '{}')",
            self.config.address(),
            self.config.hub_name()
        );

        let Some(mut handle) = self.reconnect(shutdown.as_mut()).await? else {
            return Ok(());
        };
        let mut keepalive = Keepalive::new(self.config.keepalive_interval());

        loop {
            let broken = tokio::select! {
                biased;

                _ = shutdown.as_mut() => {
                    tracing::info!("Interrupt received, closing connection");
                    self.close(handle).await;
                    return Ok(());
                }
                _ = keepalive.tick() => {
                    let beat = tokio::select! {
                        biased;

                        _ = shutdown.as_mut() => None,
                        beat = handle.heartbeat(keepalive.period()) => Some(beat),
                    };
                    match beat {
                        None => {
                            tracing::info!("Interrupt received during heartbeat, closing connection");
                            self.close(handle).await;
                            return Ok(());
                        }
                        Some(Ok(())) => {
                            tracing::debug!("Sent heartbeat");
                            false
                        }
                        Some(Err(e)) => {
                            tracing::error!("{}", e);
                            true
                        }
                    }
                }
                _ = handle.closed() => {
                    tracing::warn!("Connection closed by server");
                    true
                }
            };

            if broken {
                handle.teardown(self.config.close_grace_period()).await;
                self.state.set(ConnectionState::Disconnected);

                handle = match self.reconnect(shutdown.as_mut()).await? {
                    Some(handle) => handle,
                    None => return Ok(()),
                };
                keepalive.reset();
            }
        }
    }

    /// Opens a connection, retrying on the reconnect schedule.
    ///
    /// Returns `Ok(None)` when `shutdown` fires first and `Err` only for fatal
    /// errors.
    async fn reconnect<F>(&self, mut shutdown: Pin<&mut F>) -> Result<Option<ConnectionHandle>>
    where
        F: Future<Output = ()>,
    {
        let mut timer = Timer::new(self.config.reconnect_intervals().to_vec());

        loop {
            let attempt = tokio::select! {
                biased;

                _ = shutdown.as_mut() => {
                    tracing::info!("Interrupt received while connecting");
                    self.state.set(ConnectionState::Disconnected);
                    return Ok(None);
                }
                attempt = self.open() => attempt,
            };

            match attempt {
                Ok(handle) => {
                    self.state.set(ConnectionState::Connected);
                    if timer.attempts() > 0 {
                        tracing::info!("Reconnected after {} failed attempts", timer.attempts());
                    }
                    return Ok(Some(handle));
                }
                Err(e) if e.is_fatal() => {
                    self.state.set(ConnectionState::Disconnected);
                    tracing::error!("Giving up: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    self.state.set(ConnectionState::Disconnected);
                    tracing::error!("Connection attempt failed: {}", e);

                    tokio::select! {
                        biased;

                        _ = shutdown.as_mut() => {
                            tracing::info!("Interrupt received while waiting to reconnect");
                            return Ok(None);
                        }
                        _ = timer.schedule_timeout() => {}
                    }
                }
            }
        }
    }

    async fn open(&self) -> Result<ConnectionHandle> {
        self.state.set(ConnectionState::Negotiating);
        let negotiation = self.connection.negotiate().await?;

        self.state.set(ConnectionState::Connecting);
        self.connection.connect(negotiation).await
    }

    async fn close(&self, handle: ConnectionHandle) {
        self.state.set(ConnectionState::Closing);
        if let Err(e) = handle.close(self.config.close_grace_period()).await {
            tracing::warn!("{}", e);
        }
        self.state.set(ConnectionState::Disconnected);
        tracing::info!("Disconnected from {}", self.config.address());
    }
}
