//! Handshake URL construction.
//!
//! Scheme and address are validated once in [`Endpoints::new`]; every builder
//! after that is infallible.

use std::collections::BTreeMap;
use url::{Url, form_urlencoded};

use crate::types::{Result, SignalRError, endpoints, query_params};

/// The four handshake endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Negotiate,
    Start,
    Connect,
    Send,
}

impl EndpointKind {
    pub fn path(self) -> &'static str {
        match self {
            EndpointKind::Negotiate => endpoints::NEGOTIATE,
            EndpointKind::Start => endpoints::START,
            EndpointKind::Connect => endpoints::CONNECT,
            EndpointKind::Send => endpoints::SEND,
        }
    }

    /// Whether the endpoint is reached over the streaming scheme.
    pub fn is_streaming(self) -> bool {
        matches!(self, EndpointKind::Connect | EndpointKind::Send)
    }
}

/// Query values shared by start, connect and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeParams {
    pub protocol_version: String,
    pub transport: String,
    pub connection_token: String,
    /// Already percent-encoded, see [`encode_connection_data`]
    pub connection_data: String,
}

/// A fully derived endpoint: base, path and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    kind: EndpointKind,
    base: Url,
    query: BTreeMap<&'static str, String>,
    connection_data: Option<String>,
}

impl EndpointSpec {
    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn query(&self) -> &BTreeMap<&'static str, String> {
        &self.query
    }

    /// Renders the endpoint. Form parameters are escaped in key order and the
    /// pre-encoded connection data is appended verbatim.
    pub fn url(&self) -> Url {
        let mut url = self.base.clone();
        url.set_path(self.kind.path());

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        if let Some(data) = &self.connection_data {
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => {
                    format!("{}&{}={}", existing, query_params::CONNECTION_DATA, data)
                }
                _ => format!("{}={}", query_params::CONNECTION_DATA, data),
            };
            url.set_query(Some(&query));
        }

        url
    }
}

/// Percent-encoded `[{"Name":"<hub>"}]`, the only connection data shape the
/// server accepts.
pub fn encode_connection_data(hub_name: &str) -> String {
    let json = serde_json::json!([{ "Name": hub_name }]).to_string();
    form_urlencoded::byte_serialize(json.as_bytes()).collect()
}

/// Validated bases for one server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http_base: Url,
    stream_base: Url,
}

impl Endpoints {
    /// Builds the HTTP (`http`/`https`) and streaming (`ws`/`wss`) bases for
    /// `address`, which is a host with an optional port.
    pub fn new(scheme: &str, address: &str) -> Result<Self> {
        let stream_scheme = match scheme {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(SignalRError::Config(format!(
                    "unsupported scheme '{}', expected http or https",
                    other
                )));
            }
        };

        let http_base = Url::parse(&format!("{}://{}", scheme, address))?;
        if http_base.host_str().is_none()
            || http_base.path() != "/"
            || http_base.query().is_some()
            || !http_base.username().is_empty()
        {
            return Err(SignalRError::Config(format!(
                "address '{}' must be a bare host with an optional port",
                address
            )));
        }
        let stream_base = Url::parse(&format!("{}://{}", stream_scheme, address))?;

        Ok(Self {
            http_base,
            stream_base,
        })
    }

    /// `host:port` used for name resolution.
    pub fn authority(&self) -> String {
        let host = self.http_base.host_str().unwrap_or_default();
        match self.http_base.port_or_known_default() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Origin header value for the stream handshake.
    pub fn origin(&self) -> String {
        self.http_base.origin().ascii_serialization()
    }

    pub fn spec(&self, kind: EndpointKind, params: Option<&HandshakeParams>) -> EndpointSpec {
        let base = if kind.is_streaming() {
            self.stream_base.clone()
        } else {
            self.http_base.clone()
        };

        let mut query = BTreeMap::new();
        let mut connection_data = None;
        if kind != EndpointKind::Negotiate
            && let Some(params) = params
        {
            query.insert(
                query_params::CLIENT_PROTOCOL,
                params.protocol_version.clone(),
            );
            query.insert(query_params::TRANSPORT, params.transport.clone());
            query.insert(
                query_params::CONNECTION_TOKEN,
                params.connection_token.clone(),
            );
            connection_data = Some(params.connection_data.clone());
        }

        EndpointSpec {
            kind,
            base,
            query,
            connection_data,
        }
    }

    pub fn negotiate(&self) -> Url {
        self.spec(EndpointKind::Negotiate, None).url()
    }

    pub fn start(&self, params: &HandshakeParams) -> Url {
        self.spec(EndpointKind::Start, Some(params)).url()
    }

    pub fn connect(&self, params: &HandshakeParams) -> Url {
        self.spec(EndpointKind::Connect, Some(params)).url()
    }

    pub fn send(&self, params: &HandshakeParams) -> Url {
        self.spec(EndpointKind::Send, Some(params)).url()
    }
}
