// ── Core error types ──
//
// Errors surfaced by matchday-core. Consumers never see HTTP status codes
// or JSON parse failures directly; `From<matchday_api::Error>` translates
// wire-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach match service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Match service timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Fetch failed: {message}")]
    FetchFailed { message: String },

    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Live service has stopped")]
    ServiceStopped,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Translate a wire error from a request about `match_id`, so a 404
    /// names the match rather than the URL.
    pub fn for_match(err: matchday_api::Error, match_id: &str) -> Self {
        if err.is_not_found() {
            Self::MatchNotFound {
                match_id: match_id.to_owned(),
            }
        } else {
            err.into()
        }
    }

    /// `true` when trying again later may succeed. Not-found is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::FetchFailed { .. }
                | Self::MalformedPayload { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MatchNotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<matchday_api::Error> for CoreError {
    fn from(err: matchday_api::Error) -> Self {
        use matchday_api::Error as Api;

        match err {
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::MatchNotFound {
                        match_id: e.url().map(|u| u.path().to_owned()).unwrap_or_default(),
                    }
                } else {
                    CoreError::FetchFailed {
                        message: e.to_string(),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            Api::NotFound { resource } => CoreError::MatchNotFound {
                match_id: resource
                    .strip_prefix("match ")
                    .map_or_else(|| resource.clone(), str::to_owned),
            },
            Api::Http { status, message } => CoreError::FetchFailed {
                message: format!("HTTP {status}: {message}"),
            },
            Api::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                reason: format!("WebSocket connection failed: {reason}"),
            },
            Api::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            Api::SessionLost { sid } => CoreError::ConnectionFailed {
                reason: format!("polling session {sid} lost"),
            },
            Api::LinkClosed => CoreError::ConnectionFailed {
                reason: "push link closed".into(),
            },
            Api::Deserialization { message, body: _ } => CoreError::MalformedPayload { reason: message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_terminal() {
        let err = CoreError::from(matchday_api::Error::NotFound {
            resource: "match m9".into(),
        });
        assert!(matches!(&err, CoreError::MatchNotFound { match_id } if match_id == "m9"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = CoreError::from(matchday_api::Error::Http {
            status: 503,
            message: "busy".into(),
        });
        assert!(matches!(err, CoreError::FetchFailed { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn for_match_names_the_match() {
        let err = CoreError::for_match(
            matchday_api::Error::Http {
                status: 404,
                message: "gone".into(),
            },
            "m3",
        );
        assert!(matches!(&err, CoreError::MatchNotFound { match_id } if match_id == "m3"));
    }

    #[test]
    fn stopped_service_is_not_retryable() {
        assert!(!CoreError::ServiceStopped.is_retryable());
        assert!(!CoreError::Config { message: String::new() }.is_retryable());
    }
}
