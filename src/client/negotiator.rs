use crate::endpoint::Endpoints;
use crate::transport::Transport;
use crate::types::{NegotiationResult, Result, SignalRError, TransportError};
use std::sync::Arc;

/// Performs the negotiate step and classifies its failures.
///
/// A host the resolver definitively does not know is reported as
/// [`SignalRError::HostUnresolvable`] (fatal); everything else, including
/// temporary resolver failures, as [`SignalRError::NegotiationFailed`].
pub struct Negotiator {
    transport: Arc<dyn Transport>,
}

impl Negotiator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn negotiate(&self, endpoints: &Endpoints) -> Result<NegotiationResult> {
        let authority = endpoints.authority();
        if let Err(source) = self.transport.resolve(&authority).await {
            if is_name_not_found(&source) {
                return Err(SignalRError::HostUnresolvable {
                    host: authority,
                    source,
                });
            }
            return Err(SignalRError::NegotiationFailed(TransportError::Other(
                format!("cannot resolve {}: {}", authority, source),
            )));
        }

        let url = endpoints.negotiate();
        tracing::debug!("Negotiating with {}", url);

        let body = self
            .transport
            .get(&url)
            .await
            .map_err(SignalRError::NegotiationFailed)?;
        let result = NegotiationResult::from_json(&body).map_err(SignalRError::NegotiationFailed)?;

        if !result.try_web_sockets {
            tracing::warn!("Server does not advertise WebSocket support, trying it anyway");
        }
        tracing::info!(
            "Negotiated connection {} (protocol {})",
            result.connection_id,
            result.protocol_version
        );

        Ok(result)
    }
}

/// Whether a resolution error means the name does not exist, as opposed to
/// the resolver being unreachable or timing out.
fn is_name_not_found(error: &std::io::Error) -> bool {
    if error.kind() == std::io::ErrorKind::NotFound {
        return true;
    }
    // getaddrinfo errors carry no kind, only the gai_strerror text
    let message = error.to_string().to_lowercase();
    ["not known", "no such host", "no address associated", "nxdomain"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, FakeTransport};
    use crate::transport::DefaultTransport;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoints() -> Endpoints {
        Endpoints::new("https", "host").unwrap()
    }

    #[tokio::test]
    async fn test_negotiate_decodes_response() {
        let transport = Arc::new(FakeTransport::new());
        let negotiator = Negotiator::new(transport.clone());

        let result = negotiator.negotiate(&endpoints()).await.unwrap();
        assert_eq!(result.connection_token, "abc");
        assert_eq!(result.connection_id, "c-1");
        assert_eq!(result.keep_alive_timeout, Some(Duration::from_secs(20)));
        assert_eq!(transport.calls(), vec![Call::Resolve, Call::Negotiate]);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_fatal_and_skips_request() {
        let transport = Arc::new(FakeTransport::new().unresolvable());
        let negotiator = Negotiator::new(transport.clone());

        let err = negotiator.negotiate(&endpoints()).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, SignalRError::HostUnresolvable { ref host, .. } if host == "host:443"));
        assert_eq!(transport.calls(), vec![Call::Resolve]);
    }

    #[tokio::test]
    async fn test_request_failure_is_transient() {
        let transport = Arc::new(FakeTransport::new().failing_negotiations(1));
        let negotiator = Negotiator::new(transport);

        let err = negotiator.negotiate(&endpoints()).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, SignalRError::NegotiationFailed(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transient() {
        let transport = Arc::new(FakeTransport::new().negotiate_body("<html>502</html>"));
        let negotiator = Negotiator::new(transport);

        let err = negotiator.negotiate(&endpoints()).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, SignalRError::NegotiationFailed(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn test_negotiate_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/signalr/negotiate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Url":"/signalr","ConnectionToken":"tok","ConnectionId":"id","ProtocolVersion":"1.5","TryWebSockets":true}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let endpoints = Endpoints::new("http", &server.address().to_string()).unwrap();
        let negotiator = Negotiator::new(Arc::new(
            DefaultTransport::new(Duration::from_secs(5)).unwrap(),
        ));

        let result = negotiator.negotiate(&endpoints).await.unwrap();
        assert_eq!(result.connection_token, "tok");
        assert_eq!(result.connection_id, "id");
        assert!(result.try_web_sockets);
    }

    #[tokio::test]
    async fn test_negotiate_over_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/signalr/negotiate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let endpoints = Endpoints::new("http", &server.address().to_string()).unwrap();
        let negotiator = Negotiator::new(Arc::new(
            DefaultTransport::new(Duration::from_secs(5)).unwrap(),
        ));

        let err = negotiator.negotiate(&endpoints).await.unwrap_err();
        assert!(matches!(err, SignalRError::NegotiationFailed(TransportError::Status(500))));
    }

    #[tokio::test]
    async fn test_negotiate_refused_connection_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let endpoints = Endpoints::new("http", &address).unwrap();
        let negotiator = Negotiator::new(Arc::new(
            DefaultTransport::new(Duration::from_secs(5)).unwrap(),
        ));

        let err = negotiator.negotiate(&endpoints).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, SignalRError::NegotiationFailed(TransportError::Http(_))));
    }

    #[tokio::test]
    async fn test_negotiate_unresolvable_with_default_transport() {
        let endpoints = Endpoints::new("https", "signalr.invalid").unwrap();
        let negotiator = Negotiator::new(Arc::new(
            DefaultTransport::new(Duration::from_secs(5)).unwrap(),
        ));

        let err = negotiator.negotiate(&endpoints).await.unwrap_err();
        // Fatal with a working resolver; transient when there is no network
        assert!(matches!(
            err,
            SignalRError::HostUnresolvable { .. }
                | SignalRError::NegotiationFailed(TransportError::Other(_))
        ));
    }

    #[tokio::test]
    async fn test_temporary_resolver_failure_is_transient() {
        let transport = Arc::new(FakeTransport::new().transient_resolve_failures(1));
        let negotiator = Negotiator::new(transport.clone());

        let err = negotiator.negotiate(&endpoints()).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, SignalRError::NegotiationFailed(TransportError::Other(_))));
        assert_eq!(transport.calls(), vec![Call::Resolve]);

        assert!(negotiator.negotiate(&endpoints()).await.is_ok());
    }

    #[test]
    fn test_name_not_found_classification() {
        use std::io::{Error, ErrorKind};

        let fatal = [
            Error::new(ErrorKind::NotFound, "no addresses for host:443"),
            Error::other("failed to lookup address information: Name or service not known"),
            Error::other("failed to lookup address information: nodename nor servname provided, or not known"),
            Error::other("No such host is known. (os error 11001)"),
            Error::other("failed to lookup address information: No address associated with hostname"),
        ];
        for error in &fatal {
            assert!(is_name_not_found(error), "{}", error);
        }

        let transient = [
            Error::other("failed to lookup address information: Temporary failure in name resolution"),
            Error::new(ErrorKind::TimedOut, "timed out"),
            Error::other("failed to lookup address information: System error"),
        ];
        for error in &transient {
            assert!(!is_name_not_found(error), "{}", error);
        }
    }
}
