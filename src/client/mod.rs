// Module declarations
mod builder;
mod connection;
mod core;
mod negotiator;
mod state;

// Public API exports
pub use builder::{ClientConfig, SignalRClientBuilder, SignalRClientOptions};
pub use connection::{ConnectionHandle, ConnectionManager};
pub use self::core::SignalRClient;
pub use negotiator::Negotiator;
pub use state::{ConnectionState, StateTracker};
