use tokio::sync::watch;

/// Lifecycle state of the client. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Negotiating,
    Connecting,
    Connected,
    Closing,
}

/// Current state plus a watch channel for observers.
///
/// Only the lifecycle controller writes to it.
pub struct StateTracker {
    tx: watch::Sender<ConnectionState>,
}

impl StateTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectionState::Disconnected);
        Self { tx }
    }

    pub fn get(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Moves to `state` and notifies watchers
    pub fn set(&self, state: ConnectionState) {
        let previous = self.tx.send_replace(state);
        if previous != state {
            tracing::debug!("Connection state: {:?} -> {:?}", previous, state);
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
