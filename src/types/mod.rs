pub mod constants;
pub mod error;
pub mod negotiation;

pub use constants::*;
pub use error::{Result, SignalRError, TransportError};
pub use negotiation::NegotiationResult;
