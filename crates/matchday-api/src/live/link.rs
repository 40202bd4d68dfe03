// ── Transport-agnostic push link ──
//
// A `Link` is one open session on either transport. The transport's
// background pump owns the socket or poll loop; the link owner only sees
// two channels. Dropping the link cancels the pump.

use std::fmt;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::frame::Frame;
use crate::error::Error;

const LINK_CHANNEL_CAPACITY: usize = 256;

/// Which transport a link runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// HTTP long-polling: works through every proxy, higher overhead.
    Polling,
    /// Persistent WebSocket stream.
    Stream,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the pump reports back to the link owner.
#[derive(Debug)]
pub enum LinkEvent {
    Frame(Frame),
    /// The session ended. Always the last event on a link.
    Closed { reason: String },
}

/// Owner side of an open push session.
pub struct Link {
    kind: TransportKind,
    outbound: mpsc::Sender<Frame>,
    inbound: mpsc::Receiver<LinkEvent>,
    cancel: CancellationToken,
}

/// Pump side of an open push session, held by the transport task.
pub struct LinkPeer {
    pub outbound: mpsc::Receiver<Frame>,
    pub inbound: mpsc::Sender<LinkEvent>,
    pub cancel: CancellationToken,
}

impl LinkPeer {
    /// Report the end of the session. Ignores a link owner that already left.
    pub async fn close(&self, reason: impl Into<String>) {
        let _ = self
            .inbound
            .send(LinkEvent::Closed {
                reason: reason.into(),
            })
            .await;
    }
}

impl Link {
    /// Create a connected owner/pump pair.
    pub fn pair(kind: TransportKind) -> (Link, LinkPeer) {
        let (out_tx, out_rx) = mpsc::channel(LINK_CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(LINK_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let link = Link {
            kind,
            outbound: out_tx,
            inbound: in_rx,
            cancel: cancel.clone(),
        };
        let peer = LinkPeer {
            outbound: out_rx,
            inbound: in_tx,
            cancel,
        };
        (link, peer)
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Queue a frame for sending.
    pub async fn send(&self, frame: Frame) -> Result<(), Error> {
        self.outbound.send(frame).await.map_err(|_| Error::LinkClosed)
    }

    /// Next event from the pump. A pump that vanished without a close
    /// event is reported as closed.
    pub async fn recv(&mut self) -> LinkEvent {
        self.inbound.recv().await.unwrap_or_else(|| LinkEvent::Closed {
            reason: "transport task ended".into(),
        })
    }

    /// Take every frame already queued, without waiting. Stops at a
    /// close event.
    pub fn drain_frames(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(LinkEvent::Frame(frame)) = self.inbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Stop the pump. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("kind", &self.kind)
            .field("closed", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Opens push sessions. Implemented over HTTP by [`HttpConnector`] and by
/// in-memory fakes in tests.
///
/// [`HttpConnector`]: super::HttpConnector
pub trait Connector: Send + Sync {
    fn open(&self, kind: TransportKind) -> BoxFuture<'_, Result<Link, Error>>;
}
