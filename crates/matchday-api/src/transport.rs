// ── HTTP transport ──
//
// One reqwest client is shared by the REST endpoints and the long-polling
// pump. The client carries TLS, the connect timeout and JSON headers; the
// whole-request timeout is set per call because a long-poll is held open
// by the server for much longer than a snapshot fetch may take.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::Error;

const USER_AGENT: &str = concat!("matchday/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    #[default]
    System,
    /// Trust an extra CA from a PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (local development servers).
    DangerAcceptInvalid,
}

/// Which kind of request a timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Snapshot and commentary reads, polling handshake and frame posts.
    Rest,
    /// A receive long-poll, held open until frames arrive.
    LongPoll,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request timeout for ordinary calls.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// How long the server may hold a long-poll before answering empty.
    pub poll_hold: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            poll_hold: Duration::from_secs(25),
        }
    }
}

impl TransportConfig {
    pub fn timeout_for(&self, endpoint: Endpoint) -> Duration {
        match endpoint {
            Endpoint::Rest => self.timeout,
            Endpoint::LongPoll => self.timeout + self.poll_hold,
        }
    }

    /// Build the shared client. Request timeouts are applied by [`send`].
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .default_headers(json_headers());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                tracing::warn!("TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Send with a per-request timeout. Running out of time is reported as
/// [`Error::Timeout`] rather than a generic transport failure.
pub(crate) async fn send(request: reqwest::RequestBuilder, timeout: Duration) -> Result<reqwest::Response, Error> {
    request.timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            Error::Transport(e)
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn long_poll_outlasts_rest_timeout() {
        let config = TransportConfig {
            timeout: Duration::from_secs(5),
            poll_hold: Duration::from_secs(20),
            ..TransportConfig::default()
        };
        assert_eq!(config.timeout_for(Endpoint::Rest), Duration::from_secs(5));
        assert_eq!(config.timeout_for(Endpoint::LongPoll), Duration::from_secs(25));
    }

    #[test]
    fn missing_ca_file_is_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/ca.pem")),
            ..TransportConfig::default()
        };
        let err = config.build_client().unwrap_err();
        assert!(matches!(&err, Error::Tls(msg) if msg.contains("/nonexistent/ca.pem")), "got {err:?}");
    }

    #[test]
    fn json_is_accepted_by_default() {
        assert_eq!(json_headers()[ACCEPT], "application/json");
    }
}
