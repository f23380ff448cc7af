use super::{ConnectionManager, SignalRClient, StateTracker};
use crate::endpoint::{Endpoints, encode_connection_data};
use crate::transport::{DefaultTransport, Transport};
use crate::types::{
    CLOSE_GRACE_PERIOD, DEFAULT_SCHEME, DEFAULT_TIMEOUT, KEEPALIVE_INTERVAL, RECONNECT_INTERVALS,
    Result, SignalRError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Tunables for [`SignalRClient`]. Durations are in milliseconds; `None`
/// selects the protocol default.
#[derive(Debug, Clone)]
pub struct SignalRClientOptions {
    /// `http` or `https`; the stream uses `ws` or `wss` accordingly
    pub scheme: String,
    pub keepalive_interval: Option<u64>,
    pub reconnect_intervals: Option<Vec<u64>>,
    pub close_grace_period: Option<u64>,
    /// Timeout of the negotiate and start requests
    pub timeout: Option<u64>,
}

impl Default for SignalRClientOptions {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            keepalive_interval: None,
            reconnect_intervals: None,
            close_grace_period: None,
            timeout: None,
        }
    }
}

/// Immutable, validated configuration shared by every connection attempt.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    address: String,
    hub_name: String,
    endpoints: Endpoints,
    connection_data: String,
    keepalive_interval: Duration,
    reconnect_intervals: Vec<Duration>,
    close_grace_period: Duration,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        address: impl Into<String>,
        hub_name: impl Into<String>,
        options: &SignalRClientOptions,
    ) -> Result<Self> {
        let address = address.into();
        let hub_name = hub_name.into();

        if address.is_empty() {
            return Err(SignalRError::Config("Address is empty".to_string()));
        }
        if hub_name.is_empty() {
            return Err(SignalRError::Config("Hub name is empty".to_string()));
        }

        let endpoints = Endpoints::new(&options.scheme, &address)?;

        let keepalive_interval =
            Duration::from_millis(options.keepalive_interval.unwrap_or(KEEPALIVE_INTERVAL));
        if keepalive_interval.is_zero() {
            return Err(SignalRError::Config(
                "keepalive interval must be positive".to_string(),
            ));
        }

        let reconnect_intervals: Vec<Duration> = options
            .reconnect_intervals
            .clone()
            .unwrap_or_else(|| RECONNECT_INTERVALS.to_vec())
            .into_iter()
            .map(Duration::from_millis)
            .collect();
        if reconnect_intervals.is_empty() {
            return Err(SignalRError::Config(
                "at least one reconnect interval is required".to_string(),
            ));
        }

        Ok(Self {
            connection_data: encode_connection_data(&hub_name),
            address,
            hub_name,
            endpoints,
            keepalive_interval,
            reconnect_intervals,
            close_grace_period: Duration::from_millis(
                options.close_grace_period.unwrap_or(CLOSE_GRACE_PERIOD),
            ),
            timeout: Duration::from_millis(options.timeout.unwrap_or(DEFAULT_TIMEOUT)),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn hub_name(&self) -> &str {
        &self.hub_name
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Percent-encoded hub subscription sent with every handshake call
    pub fn connection_data(&self) -> &str {
        &self.connection_data
    }

    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }

    pub fn reconnect_intervals(&self) -> &[Duration] {
        &self.reconnect_intervals
    }

    pub fn close_grace_period(&self) -> Duration {
        self.close_grace_period
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for SignalRClient that handles initialization
pub struct SignalRClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    inbound: Option<mpsc::Sender<String>>,
}

impl SignalRClientBuilder {
    /// Create a new builder, validating the address, hub name and options
    pub fn new(
        address: impl Into<String>,
        hub_name: impl Into<String>,
        options: SignalRClientOptions,
    ) -> Result<Self> {
        Ok(Self {
            config: ClientConfig::new(address, hub_name, &options)?,
            transport: None,
            inbound: None,
        })
    }

    /// Use a custom transport instead of `reqwest` + `tokio-tungstenite`
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Forward every received payload to `tx`
    pub fn inbound(mut self, tx: mpsc::Sender<String>) -> Self {
        self.inbound = Some(tx);
        self
    }

    pub fn build(self) -> Result<SignalRClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(DefaultTransport::new(self.config.timeout())?),
        };

        let config = Arc::new(self.config);
        let mut connection = ConnectionManager::new(Arc::clone(&config), transport);
        if let Some(tx) = self.inbound {
            connection = connection.with_inbound(tx);
        }

        Ok(SignalRClient {
            config,
            connection,
            state: StateTracker::new(),
        })
    }
}
