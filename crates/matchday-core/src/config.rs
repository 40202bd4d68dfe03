// ── Runtime service configuration ──
//
// Describes *where* the match data service lives and how to talk to it.
// Never touches disk: the CLI (via matchday-config) builds a `LiveConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use matchday_api::{ReconnectConfig, TlsMode, TransportConfig};

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Only for local development servers.
    DangerAcceptInvalid,
}

/// Configuration for one `LiveService`.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// REST base URL, e.g. `https://scores.example.com/api/`.
    pub api_url: Url,
    /// Push namespace root. Defaults to `{api_url}/live/`.
    pub live_url: Option<Url>,
    /// Open the push channel at all. When `false` the service runs
    /// poll-only and sits in `Degraded` from the start.
    pub push_enabled: bool,
    /// Try to move from long-polling to the WebSocket stream after connect.
    pub upgrade_transport: bool,
    pub tls: TlsVerification,
    /// Timeout for REST calls and polling handshakes.
    pub timeout: Duration,
    /// Server hold time for a long-poll; receive calls may take
    /// `timeout + poll_hold`.
    pub poll_hold: Duration,
    pub reconnect: ReconnectConfig,
    /// Commentary view refresh period.
    pub commentary_poll_interval: Duration,
    /// REST snapshot refresh period while the push channel is down.
    pub snapshot_poll_interval: Duration,
    /// How long a snapshot nobody holds is kept before it is swept.
    pub unheld_retention: Duration,
}

impl LiveConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            live_url: None,
            push_enabled: true,
            upgrade_transport: true,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_hold: Duration::from_secs(25),
            reconnect: ReconnectConfig::default(),
            commentary_poll_interval: Duration::from_secs(10),
            snapshot_poll_interval: Duration::from_secs(15),
            unheld_retention: Duration::from_secs(30),
        }
    }

    /// Parse `api_url` and build a config with defaults.
    pub fn parse(api_url: &str) -> Result<Self, CoreError> {
        let url = Url::parse(api_url).map_err(|e| CoreError::Config {
            message: format!("invalid API URL '{api_url}': {e}"),
        })?;
        Ok(Self::new(url))
    }

    /// Push namespace root, always with a trailing slash.
    pub fn live_base(&self) -> Result<Url, CoreError> {
        let url = match &self.live_url {
            Some(url) => url.clone(),
            None => with_trailing_slash(self.api_url.clone())
                .join("live/")
                .map_err(|e| CoreError::Config {
                    message: format!("cannot derive live URL from {}: {e}", self.api_url),
                })?,
        };
        if url.cannot_be_a_base() {
            return Err(CoreError::Config {
                message: format!("live URL {url} cannot be a base"),
            });
        }
        Ok(with_trailing_slash(url))
    }

    /// HTTP transport settings shared by the REST client and polling transport.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            poll_hold: self.poll_hold,
            ..TransportConfig::default()
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
