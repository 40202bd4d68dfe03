use thiserror::Error;

/// Top-level error type for the `matchday-api` crate.
///
/// Covers every failure mode of the wire layer: HTTP transport, the REST
/// match endpoints, and both push-channel transports (long-polling and
/// WebSocket stream). `matchday-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── REST ────────────────────────────────────────────────────────
    /// The requested resource does not exist (HTTP 404).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Non-success HTTP status with the server's message, if any.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Push channel ────────────────────────────────────────────────
    /// WebSocket stream could not be opened or failed mid-session.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed by the server.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// The long-polling session id was rejected by the server.
    #[error("Polling session {sid} is no longer valid")]
    SessionLost { sid: String },

    /// The link's background pump has gone away.
    #[error("Push link closed")]
    LinkClosed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout { .. }
            | Self::WebSocketConnect(_)
            | Self::WebSocketClosed { .. }
            | Self::SessionLost { .. }
            | Self::LinkClosed => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Http { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}
