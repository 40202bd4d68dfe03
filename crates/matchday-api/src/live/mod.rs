//! Push channel on the `/live` namespace.
//!
//! Two transports carry the same JSON frames: HTTP long-polling (always
//! works, higher overhead) and a WebSocket stream. [`HttpConnector`] opens
//! either on request; negotiation, reconnection and subscription replay live
//! in `matchday-core`.
//!
//! # Example
//!
//! ```rust,ignore
//! use matchday_api::live::{Connector, HttpConnector, TransportKind};
//! use matchday_api::TransportConfig;
//! use url::Url;
//!
//! let live = Url::parse("https://scores.example.com/api/live/")?;
//! let connector = HttpConnector::new(live, &TransportConfig::default())?;
//!
//! let mut link = connector.open(TransportKind::Polling).await?;
//! while let LinkEvent::Frame(frame) = link.recv().await {
//!     println!("{}: {}", frame.event, frame.data);
//! }
//! ```

mod backoff;
mod frame;
mod link;
mod polling;
mod websocket;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

pub use backoff::ReconnectConfig;
pub use frame::{ClientMessage, Frame, InboundMessage, MatchUpdate, Notification};
pub use link::{Connector, Link, LinkEvent, LinkPeer, TransportKind};
pub use websocket::stream_url;

/// Event-name constants for the `/live` namespace.
pub mod events {
    pub use super::frame::{
        GOAL_SCORED, LEGACY_SCORE_UPDATE, MATCH_ENDED, MATCH_STARTED, MATCH_UPDATE, NEW_CONTENT,
        NOTIFICATION, SUBSCRIBE_MATCH, UNSUBSCRIBE_MATCH, WICKET_FALLEN,
    };
}

/// Opens push sessions against a real server.
#[derive(Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
    live_base: Url,
    timeouts: polling::PollTimeouts,
}

impl HttpConnector {
    /// `live_base` is the namespace root, e.g. `https://host/api/live/`.
    /// A missing trailing slash is added.
    pub fn new(live_base: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut connector = Self::from_reqwest(live_base, http);
        connector.timeouts = polling::PollTimeouts::from(transport);
        Ok(connector)
    }

    /// Wrap an existing `reqwest::Client` with the default timeouts.
    pub fn from_reqwest(mut live_base: Url, http: reqwest::Client) -> Self {
        if !live_base.path().ends_with('/') {
            let path = format!("{}/", live_base.path());
            live_base.set_path(&path);
        }
        Self {
            http,
            live_base,
            timeouts: polling::PollTimeouts::from(&TransportConfig::default()),
        }
    }

    pub fn live_base(&self) -> &Url {
        &self.live_base
    }
}

impl Connector for HttpConnector {
    fn open(&self, kind: TransportKind) -> BoxFuture<'_, Result<Link, Error>> {
        async move {
            match kind {
                TransportKind::Polling => {
                    polling::open_polling(self.http.clone(), &self.live_base, self.timeouts).await
                }
                TransportKind::Stream => {
                    let url = stream_url(&self.live_base)?;
                    websocket::open_stream(&url).await
                }
            }
        }
        .boxed()
    }
}
