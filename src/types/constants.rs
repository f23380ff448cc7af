/// SignalR handshake paths
pub mod endpoints {
    pub const NEGOTIATE: &str = "/signalr/negotiate";
    pub const START: &str = "/signalr/start";
    pub const CONNECT: &str = "/signalr/connect";
    pub const SEND: &str = "/signalr/send";
}

/// Query parameter names shared by the start, connect and send endpoints
pub mod query_params {
    pub const CLIENT_PROTOCOL: &str = "clientProtocol";
    pub const TRANSPORT: &str = "transport";
    pub const CONNECTION_TOKEN: &str = "connectionToken";
    pub const CONNECTION_DATA: &str = "connectionData";
}

/// Payloads written to the live stream
pub mod payloads {
    /// Empty form body of the send endpoint, used as the heartbeat
    pub const HEARTBEAT: &str = "data=";
    /// Protocol-level close request
    pub const CLOSE: &str = "close";
}

/// WebSocket transport name as the server expects it
pub const TRANSPORT_WEBSOCKETS: &str = "webSockets";

/// Protocol version assumed when the server omits one
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.5";

/// Default HTTP scheme for negotiate and start
pub const DEFAULT_SCHEME: &str = "https";

/// Default keepalive interval (milliseconds)
pub const KEEPALIVE_INTERVAL: u64 = 10_000;

/// Default reconnect intervals (milliseconds); the last one repeats
pub const RECONNECT_INTERVALS: [u64; 1] = [30_000];

/// Grace period for the close handshake (milliseconds)
pub const CLOSE_GRACE_PERIOD: u64 = 1_000;

/// Default timeout for negotiate and start requests (milliseconds)
pub const DEFAULT_TIMEOUT: u64 = 10_000;

/// Frames this short (e.g. `{}`) are server keepalives and are not surfaced
pub const KEEPALIVE_FRAME_LEN: usize = 2;
