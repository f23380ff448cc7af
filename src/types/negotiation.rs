use serde::{Deserialize, Deserializer};
use std::time::Duration;

use super::constants::DEFAULT_PROTOCOL_VERSION;
use super::error::TransportError;

/// Server response to the negotiate request.
///
/// Timing values arrive as (possibly fractional) seconds and are decoded into
/// [`Duration`]s; `null` or a missing key yields `None`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NegotiationResult {
    #[serde(default)]
    pub url: String,
    pub connection_token: String,
    #[serde(default)]
    pub connection_id: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default)]
    pub try_web_sockets: bool,
    #[serde(default, deserialize_with = "seconds")]
    pub keep_alive_timeout: Option<Duration>,
    #[serde(default, deserialize_with = "seconds")]
    pub disconnect_timeout: Option<Duration>,
    #[serde(default, deserialize_with = "seconds")]
    pub connection_timeout: Option<Duration>,
    #[serde(default, deserialize_with = "seconds")]
    pub transport_connect_timeout: Option<Duration>,
    #[serde(default, alias = "LogPollDelay", deserialize_with = "seconds")]
    pub long_poll_delay: Option<Duration>,
}

impl NegotiationResult {
    /// Decodes a negotiate response body.
    pub fn from_json(body: &str) -> std::result::Result<Self, TransportError> {
        let result: NegotiationResult = serde_json::from_str(body)?;
        if result.connection_token.is_empty() {
            return Err(TransportError::InvalidResponse(
                "empty connection token".to_string(),
            ));
        }
        Ok(result)
    }
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    Ok(secs.and_then(|s| Duration::try_from_secs_f64(s).ok()))
}
